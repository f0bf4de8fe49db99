use crate::errors::{Collision, Error, Result};
use crate::mask::{Extractor, Generator};
use ignore::WalkBuilder;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::LazyLock;
use tracing::{debug, info};

static NUMERIC_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]+(\.[0-9]+)?$").expect("numeric token pattern is valid"));

/// One proposed rename.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenamePlanEntry {
    pub original_path: PathBuf,
    pub proposed_path: PathBuf,
    /// The token as extracted, before any padding.
    pub extracted_token: String,
}

/// Why a file is left out of the plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SkipReason {
    NoMatch,
    NotUtf8,
    Unchanged,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::NoMatch => f.write_str("does not match the mask"),
            SkipReason::NotUtf8 => f.write_str("name is not valid UTF-8"),
            SkipReason::Unchanged => f.write_str("name is unchanged"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Skipped {
    pub file_name: String,
    pub reason: SkipReason,
}

/// The full set of proposed renames for one folder.
#[derive(Debug, Clone, Serialize)]
pub struct Plan {
    pub directory: PathBuf,
    pub entries: Vec<RenamePlanEntry>,
    pub skipped: Vec<Skipped>,
}

impl Plan {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Which part of a filename the masks apply to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MatchScope {
    /// The whole name, extension included.
    #[default]
    FileName,
    /// The name without its final extension; the extension is carried over unchanged.
    Stem,
}

/// Zero-padding applied to numeric tokens before they are written into the output mask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(try_from = "PaddingRepr")]
pub enum Padding {
    #[default]
    None,
    /// Pad to the digit count of the largest number, if every token is numeric.
    Auto,
    /// Pad every numeric token to at least this width.
    Width(usize),
}

/// The widest zero-padding accepted; no file system allows longer names.
pub const MAX_PAD_WIDTH: usize = 255;

impl Padding {
    fn width(n: usize) -> std::result::Result<Self, String> {
        if n > MAX_PAD_WIDTH {
            return Err(format!("padding width {n} exceeds the maximum of {MAX_PAD_WIDTH}"));
        }
        Ok(Padding::Width(n))
    }
}

impl FromStr for Padding {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "" | "none" => Ok(Padding::None),
            "auto" => Ok(Padding::Auto),
            other => other
                .parse()
                .map_err(|_| format!("invalid padding {s:?}, expected none, auto or a width"))
                .and_then(Padding::width),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PaddingRepr {
    Width(usize),
    Name(String),
}

impl TryFrom<PaddingRepr> for Padding {
    type Error = String;

    fn try_from(repr: PaddingRepr) -> std::result::Result<Self, Self::Error> {
        match repr {
            PaddingRepr::Width(n) => Padding::width(n),
            PaddingRepr::Name(s) => s.parse(),
        }
    }
}

/// Builds a [`Plan`] from an extractor and a generator.
pub struct Planner<'a> {
    extractor: &'a Extractor,
    generator: &'a Generator,
    scope: MatchScope,
    padding: Padding,
    include_hidden: bool,
}

impl<'a> Planner<'a> {
    pub fn new(extractor: &'a Extractor, generator: &'a Generator) -> Self {
        Self {
            extractor,
            generator,
            scope: MatchScope::default(),
            padding: Padding::default(),
            include_hidden: false,
        }
    }

    pub fn scope(mut self, scope: MatchScope) -> Self {
        self.scope = scope;
        self
    }

    pub fn padding(mut self, padding: Padding) -> Self {
        self.padding = padding;
        self
    }

    pub fn include_hidden(mut self, include_hidden: bool) -> Self {
        self.include_hidden = include_hidden;
        self
    }

    /// Plans every regular file directly inside `directory`.
    pub fn plan(&self, directory: &Path) -> Result<Plan> {
        let files = list_files(directory, self.include_hidden)?;
        self.plan_files(directory, &files)
    }

    /// Plans an explicit list of files that live in `directory`.
    ///
    /// Files the extractor does not match are skipped, never fatal. If two files
    /// would end up with the same name the whole plan fails with
    /// [`Error::Collision`].
    pub fn plan_files(&self, directory: &Path, files: &[PathBuf]) -> Result<Plan> {
        let mut names: Vec<&std::ffi::OsStr> = files.iter().filter_map(|p| p.file_name()).collect();
        names.sort();

        let mut skipped = Vec::new();
        let mut candidates = Vec::new();

        for os_name in names {
            let Some(name) = os_name.to_str() else {
                skipped.push(Skipped {
                    file_name: os_name.to_string_lossy().into_owned(),
                    reason: SkipReason::NotUtf8,
                });
                continue;
            };

            let (subject, extension) = match self.scope {
                MatchScope::FileName => (name, None),
                MatchScope::Stem => split_extension(name),
            };

            match self.extractor.extract(subject) {
                Ok(token) => candidates.push((name, token.to_string(), extension)),
                Err(Error::NoMatch { .. }) => {
                    debug!(file = name, "no match");
                    skipped.push(Skipped {
                        file_name: name.to_string(),
                        reason: SkipReason::NoMatch,
                    });
                }
                Err(e) => return Err(e),
            }
        }

        let width = pad_width(self.padding, candidates.iter().map(|(_, t, _)| t.as_str()));

        let mut claims: BTreeMap<PathBuf, Vec<PathBuf>> = BTreeMap::new();
        let mut entries = Vec::new();

        for (name, token, extension) in candidates {
            let mut new_name = self.generator.generate(&zero_pad(&token, width));
            if let Some(ext) = extension {
                new_name.push('.');
                new_name.push_str(ext);
            }

            let original_path = directory.join(name);
            let proposed_path = directory.join(&new_name);
            claims
                .entry(proposed_path.clone())
                .or_default()
                .push(original_path.clone());

            if new_name == name {
                skipped.push(Skipped {
                    file_name: name.to_string(),
                    reason: SkipReason::Unchanged,
                });
                continue;
            }

            entries.push(RenamePlanEntry {
                original_path,
                proposed_path,
                extracted_token: token,
            });
        }

        let collisions: Vec<Collision> = claims
            .into_iter()
            .filter(|(_, originals)| originals.len() > 1)
            .map(|(proposed, originals)| Collision { proposed, originals })
            .collect();
        if !collisions.is_empty() {
            return Err(Error::Collision { collisions });
        }

        skipped.sort_by(|a, b| a.file_name.cmp(&b.file_name));
        info!(
            directory = %directory.display(),
            entries = entries.len(),
            skipped = skipped.len(),
            "plan ready"
        );

        Ok(Plan {
            directory: directory.to_path_buf(),
            entries,
            skipped,
        })
    }
}

/// Plans `directory` with the default options.
pub fn plan(directory: &Path, extractor: &Extractor, generator: &Generator) -> Result<Plan> {
    Planner::new(extractor, generator).plan(directory)
}

/// Lists the regular files directly inside `directory`, sorted by name.
pub fn list_files(directory: &Path, include_hidden: bool) -> Result<Vec<PathBuf>> {
    let walker = WalkBuilder::new(directory)
        .standard_filters(false)
        .hidden(!include_hidden)
        .max_depth(Some(1))
        .build();

    let mut files = Vec::new();
    for entry in walker {
        let entry = entry?;
        if entry.depth() == 1 && entry.path().is_file() {
            files.push(entry.into_path());
        }
    }
    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}

/// The part of `name` masks see under [`MatchScope::Stem`], plus its extension.
pub fn split_extension(name: &str) -> (&str, Option<&str>) {
    match name.rfind('.') {
        Some(i) if i > 0 => (&name[..i], Some(&name[i + 1..])),
        _ => (name, None),
    }
}

fn is_numeric(token: &str) -> bool {
    NUMERIC_TOKEN.is_match(token)
}

fn pad_width<'t>(padding: Padding, tokens: impl Iterator<Item = &'t str>) -> usize {
    match padding {
        Padding::None => 0,
        Padding::Width(n) => n.min(MAX_PAD_WIDTH),
        Padding::Auto => {
            let mut width = 0;
            for token in tokens {
                if !is_numeric(token) {
                    return 0;
                }
                let int_part = token.split('.').next().unwrap_or(token);
                let digits = int_part.trim_start_matches('0').len().max(1);
                width = width.max(digits);
            }
            width
        }
    }
}

fn zero_pad(token: &str, width: usize) -> String {
    if width <= token.len() || !is_numeric(token) {
        return token.to_string();
    }
    format!("{}{}", "0".repeat(width - token.len()), token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mask::DEFAULT_PLACEHOLDER;
    use std::fs;
    use tempfile::TempDir;

    fn folder(names: &[&str]) -> TempDir {
        let temp = TempDir::new().unwrap();
        for name in names {
            fs::write(temp.path().join(name), b"").unwrap();
        }
        temp
    }

    fn masks(extract: &str, output: &str) -> (Extractor, Generator) {
        (
            Extractor::compile(extract, DEFAULT_PLACEHOLDER).unwrap(),
            Generator::compile(output, DEFAULT_PLACEHOLDER).unwrap(),
        )
    }

    fn proposed_names(plan: &Plan) -> Vec<String> {
        plan.entries
            .iter()
            .map(|e| e.proposed_path.file_name().unwrap().to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn test_plan_hawaii() {
        let temp = folder(&["image03.img", "image01.img", "image02.img"]);
        let (ex, generator) = masks("image%s.img", "Hawaii - %s.img");

        let plan = plan(temp.path(), &ex, &generator).unwrap();
        assert_eq!(
            proposed_names(&plan),
            ["Hawaii - 01.img", "Hawaii - 02.img", "Hawaii - 03.img"]
        );
        assert!(plan.skipped.is_empty());
        assert_eq!(plan.entries[0].original_path, temp.path().join("image01.img"));
        assert_eq!(plan.entries[0].extracted_token, "01");
    }

    #[test]
    fn test_non_matching_files_are_skipped() {
        let temp = folder(&["image01.img", "notes.txt", "image02.img"]);
        let (ex, generator) = masks("image%s.img", "pic%s.img");

        let plan = plan(temp.path(), &ex, &generator).unwrap();
        assert_eq!(proposed_names(&plan), ["pic01.img", "pic02.img"]);
        assert_eq!(
            plan.skipped,
            [Skipped {
                file_name: "notes.txt".into(),
                reason: SkipReason::NoMatch
            }]
        );
    }

    #[test]
    fn test_padded_tokens_that_coincide_collide() {
        let temp = folder(&["p1.txt", "p01.txt", "p10.txt"]);
        let (ex, generator) = masks("p%s.txt", "page %s.txt");

        let err = Planner::new(&ex, &generator)
            .padding(Padding::Auto)
            .plan(temp.path())
            .unwrap_err();
        match err {
            Error::Collision { collisions } => {
                assert_eq!(collisions.len(), 1);
                assert_eq!(collisions[0].proposed, temp.path().join("page 01.txt"));
                assert_eq!(
                    collisions[0].originals,
                    [temp.path().join("p01.txt"), temp.path().join("p1.txt")]
                );
            }
            other => panic!("unexpected: {other:?}"),
        }
        // Nothing touched.
        assert_eq!(list_files(temp.path(), false).unwrap().len(), 3);
    }

    #[test]
    fn test_auto_padding() {
        let temp = folder(&["p1.txt", "p2.txt", "p10.txt"]);
        let (ex, generator) = masks("p%s.txt", "page %s.txt");

        let plan = Planner::new(&ex, &generator)
            .padding(Padding::Auto)
            .plan(temp.path())
            .unwrap();
        assert_eq!(
            proposed_names(&plan),
            ["page 01.txt", "page 10.txt", "page 02.txt"]
        );
        assert_eq!(plan.entries[2].extracted_token, "2");
    }

    #[test]
    fn test_auto_padding_needs_all_numeric() {
        assert_eq!(pad_width(Padding::Auto, ["1", "22", "x"].into_iter()), 0);
        assert_eq!(pad_width(Padding::Auto, ["1", "022", "3.5"].into_iter()), 2);
        assert_eq!(pad_width(Padding::Width(4), ["x"].into_iter()), 4);
        assert_eq!(zero_pad("7", 3), "007");
        assert_eq!(zero_pad("1.5", 4), "01.5");
        assert_eq!(zero_pad("ab", 4), "ab");
        assert_eq!(zero_pad("1234", 2), "1234");
    }

    #[test]
    fn test_stem_scope_keeps_extension() {
        let temp = folder(&["my note (1).txt", "my note (2).md", "my note (3)"]);
        let (ex, generator) = masks("my note (%s)", "Note %s");

        let plan = Planner::new(&ex, &generator)
            .scope(MatchScope::Stem)
            .plan(temp.path())
            .unwrap();
        assert_eq!(proposed_names(&plan), ["Note 1.txt", "Note 2.md", "Note 3"]);
    }

    #[test]
    fn test_unchanged_names_are_skipped() {
        let temp = folder(&["a1.txt", "b1.txt"]);
        let (ex, generator) = masks("%s1.txt", "%s1.txt");
        let plan = plan(temp.path(), &ex, &generator).unwrap();
        assert!(plan.is_empty());
        assert!(plan.skipped.iter().all(|s| s.reason == SkipReason::Unchanged));
    }

    #[test]
    fn test_rename_onto_unchanged_file_collides() {
        let temp = folder(&["1.txt", "01.txt"]);
        let (ex, generator) = masks("%s.txt", "%s.txt");
        let err = Planner::new(&ex, &generator)
            .padding(Padding::Width(2))
            .plan(temp.path())
            .unwrap_err();
        assert!(matches!(err, Error::Collision { .. }));
    }

    #[test]
    fn test_hidden_files_and_subfolders_are_excluded() {
        let temp = folder(&["img1.jpg", ".img2.jpg"]);
        fs::create_dir(temp.path().join("img3.jpg")).unwrap();

        let visible = list_files(temp.path(), false).unwrap();
        assert_eq!(visible, [temp.path().join("img1.jpg")]);

        let all = list_files(temp.path(), true).unwrap();
        assert_eq!(all, [temp.path().join(".img2.jpg"), temp.path().join("img1.jpg")]);
    }

    #[test]
    fn test_split_extension() {
        assert_eq!(split_extension("a.tar.gz"), ("a.tar", Some("gz")));
        assert_eq!(split_extension(".bashrc"), (".bashrc", None));
        assert_eq!(split_extension("README"), ("README", None));
    }

    #[test]
    fn test_padding_from_str() {
        assert_eq!("auto".parse::<Padding>().unwrap(), Padding::Auto);
        assert_eq!("None".parse::<Padding>().unwrap(), Padding::None);
        assert_eq!("3".parse::<Padding>().unwrap(), Padding::Width(3));
        assert!("wide".parse::<Padding>().is_err());
    }

    #[test]
    fn test_padding_width_is_capped() {
        assert_eq!("255".parse::<Padding>().unwrap(), Padding::Width(MAX_PAD_WIDTH));
        assert!("256".parse::<Padding>().is_err());
        assert!("99999999999".parse::<Padding>().is_err());
        assert!(Padding::try_from(PaddingRepr::Width(1 << 40)).is_err());
        assert_eq!(pad_width(Padding::Width(usize::MAX), ["1"].into_iter()), MAX_PAD_WIDTH);
    }
}
