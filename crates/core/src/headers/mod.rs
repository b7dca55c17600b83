//! Header attribution: turning the engine's per-object dependency dump into a
//! per-target set of tracked header files.
//!
//! The dump only names object files, so the owning target has to be inferred
//! from the object path. That inference is delegated to a [`TargetMatcher`];
//! [`SegmentMatcher`] is the default and documents the ordering used when
//! several targets match the same object.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::model::Target;

#[derive(Debug, Error)]
pub enum HeaderError {
    #[error("Failed to resolve {role} directory {path}: {source}")]
    Directory {
        role: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// One block of the dependency listing: an object and the files it was built from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyRecord {
    pub object: String,
    pub dependencies: Vec<String>,
}

/// Parse the output of `ninja -t deps`.
///
/// Blocks are separated by blank lines. Each starts with
/// `<object>: #deps N, deps mtime M (VALID)` followed by indented dependency
/// paths. Dependencies given inline after `<object>: ` are accepted as well.
/// Lines whose object part is not a path, such as the `INFO: ...` messages the
/// meson front end prints before running Ninja, are skipped.
pub fn parse_dependency_listing(listing: &str) -> Vec<DependencyRecord> {
    let normalized = listing.replace("\r\n", "\n").replace('\r', "\n");
    let mut records = Vec::new();
    let mut current: Option<DependencyRecord> = None;

    for line in normalized.lines() {
        if line.trim().is_empty() {
            records.extend(current.take());
            continue;
        }

        if line.starts_with(char::is_whitespace) {
            if let Some(record) = current.as_mut() {
                record.dependencies.extend(line.split_whitespace().map(str::to_string));
            }
            continue;
        }

        records.extend(current.take());
        let (object, rest) = match line.find(": ") {
            Some(idx) => (&line[..idx], &line[idx + 2..]),
            None => match line.strip_suffix(':') {
                Some(object) => (object, ""),
                None => {
                    debug!(line, "skipping unrecognized dependency listing line");
                    continue;
                }
            },
        };
        let object = object.trim();
        if !looks_like_object(object) {
            debug!(line, "skipping non-record line in dependency listing");
            continue;
        }
        let dependencies = if rest.trim_start().starts_with('#') {
            Vec::new()
        } else {
            rest.split_whitespace().map(str::to_string).collect()
        };
        current = Some(DependencyRecord { object: object.to_string(), dependencies });
    }
    records.extend(current);

    records
}

/// Object paths always carry a separator or an extension and never spaces.
fn looks_like_object(object: &str) -> bool {
    !object.is_empty()
        && !object.contains(char::is_whitespace)
        && object.contains(['/', '\\', '.'])
}

/// How strongly an object path points at a target. Higher is stronger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum MatchClass {
    /// The object's file stem equals the target name (`lib/sub/b.o` for `b`).
    FileStem,
    /// A directory segment equals the target name.
    DirectorySegment,
    /// A directory segment is the target's private object directory
    /// (`<name>.p` or `<output file name>.p`).
    PrivateDirectory,
}

/// Ordering key for a match: class first, then depth (deeper wins).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct MatchScore {
    pub class: MatchClass,
    pub depth: usize,
}

/// Decides whether an object path belongs to a target.
pub trait TargetMatcher {
    /// `None` when the object cannot belong to `target`.
    fn score(&self, object: &str, target: &Target) -> Option<MatchScore>;
}

/// Whole-segment matcher. Substrings never match: target `lib` does not
/// claim `libfoo/x.o`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SegmentMatcher;

impl TargetMatcher for SegmentMatcher {
    fn score(&self, object: &str, target: &Target) -> Option<MatchScore> {
        let segments: Vec<&str> = object.split(['/', '\\']).filter(|s| !s.is_empty()).collect();
        let (file, dirs) = segments.split_last()?;

        let by_name = format!("{}.p", target.name);
        let by_output = target.output_file_name().map(|n| format!("{n}.p"));

        let mut best: Option<MatchScore> = None;
        for (depth, segment) in dirs.iter().enumerate() {
            let class = if *segment == by_name || by_output.as_deref() == Some(*segment) {
                MatchClass::PrivateDirectory
            } else if *segment == target.name {
                MatchClass::DirectorySegment
            } else {
                continue;
            };
            best = best.max(Some(MatchScore { class, depth }));
        }

        let stem = file.split('.').next().unwrap_or(file);
        if stem == target.name {
            best = best.max(Some(MatchScore { class: MatchClass::FileStem, depth: dirs.len() }));
        }
        best
    }
}

/// Result of picking a target for one object.
#[derive(Debug, Clone, Copy)]
pub struct Selection<'t> {
    pub target: Option<&'t Target>,
    /// Number of targets that matched at all.
    pub candidates: usize,
}

/// Pick the best-scoring target for `object`.
///
/// `ordered` must already be sorted by identity; on equal scores the earlier
/// target wins, which pins ties to ascending identity order.
pub fn select_target<'t>(
    object: &str,
    ordered: &[&'t Target],
    matcher: &dyn TargetMatcher,
) -> Selection<'t> {
    let mut best: Option<(MatchScore, &'t Target)> = None;
    let mut candidates = 0;
    for target in ordered {
        let Some(score) = matcher.score(object, target) else {
            continue;
        };
        candidates += 1;
        if best.map_or(true, |(current, _)| score > current) {
            best = Some((score, *target));
        }
    }
    Selection { target: best.map(|(_, t)| t), candidates }
}

/// Tracked headers per target identity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HeaderSet {
    by_target: BTreeMap<PathBuf, BTreeSet<PathBuf>>,
}

impl HeaderSet {
    pub fn get(&self, identity: &Path) -> Option<&BTreeSet<PathBuf>> {
        self.by_target.get(identity)
    }

    /// Headers for `identity` as a sorted list; empty when unknown.
    pub fn headers_for(&self, identity: &Path) -> Vec<PathBuf> {
        self.get(identity).map(|set| set.iter().cloned().collect()).unwrap_or_default()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&PathBuf, &BTreeSet<PathBuf>)> {
        self.by_target.iter()
    }

    /// Total number of attributed headers across all targets.
    pub fn total(&self) -> usize {
        self.by_target.values().map(BTreeSet::len).sum()
    }
}

/// Counters describing one attribution pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributionStats {
    pub records: usize,
    pub attributed: usize,
    pub unattributed: usize,
    /// Objects matched by more than one target.
    pub ambiguous: usize,
    pub headers_kept: usize,
    pub headers_discarded: usize,
}

#[derive(Debug, Clone, Default)]
pub struct HeaderAttribution {
    pub headers: HeaderSet,
    pub stats: AttributionStats,
}

/// Attributes dependency records to targets and keeps only in-tree headers.
pub struct HeaderResolver<'m> {
    matcher: &'m dyn TargetMatcher,
    build_dir: PathBuf,
    source_root: PathBuf,
    build_root: PathBuf,
    cache: HashMap<String, Option<PathBuf>>,
}

impl<'m> HeaderResolver<'m> {
    /// `build_dir` is the directory relative dependency paths are resolved
    /// against (the engine's working directory).
    pub fn new(
        matcher: &'m dyn TargetMatcher,
        source_dir: &Path,
        build_dir: &Path,
    ) -> Result<Self, HeaderError> {
        let source_root = source_dir.canonicalize().map_err(|source| HeaderError::Directory {
            role: "source",
            path: source_dir.to_path_buf(),
            source,
        })?;
        let build_root = build_dir.canonicalize().map_err(|source| HeaderError::Directory {
            role: "build",
            path: build_dir.to_path_buf(),
            source,
        })?;
        Ok(Self {
            matcher,
            build_dir: build_dir.to_path_buf(),
            source_root,
            build_root,
            cache: HashMap::new(),
        })
    }

    pub fn attribute(
        &mut self,
        records: &[DependencyRecord],
        targets: &[Target],
    ) -> HeaderAttribution {
        let mut ordered: Vec<&Target> = targets.iter().collect();
        ordered.sort_by(|a, b| a.identity.cmp(&b.identity));

        let mut by_target: BTreeMap<PathBuf, BTreeSet<PathBuf>> =
            targets.iter().map(|t| (t.identity.clone(), BTreeSet::new())).collect();
        let mut stats = AttributionStats { records: records.len(), ..Default::default() };

        for record in records {
            let selection = select_target(&record.object, &ordered, self.matcher);
            let Some(target) = selection.target else {
                debug!(object = %record.object, "no target for object; dropping record");
                stats.unattributed += 1;
                continue;
            };
            if selection.candidates > 1 {
                warn!(
                    object = %record.object,
                    chosen = %target.identity.display(),
                    candidates = selection.candidates,
                    "ambiguous object attribution"
                );
                stats.ambiguous += 1;
            }
            stats.attributed += 1;

            let set = by_target.entry(target.identity.clone()).or_default();
            for dependency in &record.dependencies {
                match self.resolve(dependency) {
                    Some(path) => {
                        set.insert(path);
                        stats.headers_kept += 1;
                    }
                    None => stats.headers_discarded += 1,
                }
            }
        }

        let headers = HeaderSet { by_target };
        info!(
            records = stats.records,
            attributed = stats.attributed,
            unattributed = stats.unattributed,
            headers = headers.total(),
            "attributed headers"
        );
        HeaderAttribution { headers, stats }
    }

    /// Canonical path of `raw` when it is a file inside the source tree and
    /// outside the build directory.
    pub fn resolve(&mut self, raw: &str) -> Option<PathBuf> {
        if let Some(cached) = self.cache.get(raw) {
            return cached.clone();
        }
        let resolved = self.resolve_uncached(raw);
        self.cache.insert(raw.to_string(), resolved.clone());
        resolved
    }

    fn resolve_uncached(&self, raw: &str) -> Option<PathBuf> {
        let candidate = Path::new(raw);
        let joined = if candidate.is_absolute() {
            candidate.to_path_buf()
        } else {
            self.build_dir.join(candidate)
        };
        let canonical = joined.canonicalize().ok()?;
        if canonical.starts_with(&self.build_root) {
            return None;
        }
        let relative = canonical.strip_prefix(&self.source_root).ok()?;
        if !self.source_root.join(relative).is_file() {
            return None;
        }
        Some(canonical)
    }
}

/// Parse `listing` and attribute it with `matcher` in one go.
pub fn attribute_listing(
    listing: &str,
    targets: &[Target],
    matcher: &dyn TargetMatcher,
    source_dir: &Path,
    build_dir: &Path,
) -> Result<HeaderAttribution, HeaderError> {
    let records = parse_dependency_listing(listing);
    let mut resolver = HeaderResolver::new(matcher, source_dir, build_dir)?;
    Ok(resolver.attribute(&records, targets))
}
