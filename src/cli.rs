//! Minimal CLI: schema JSON → (validator | table definitions)
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use indexmap::{IndexMap, IndexSet};
use rayon::prelude::*;

use crate::convert::{Converter, ModifierContext};
use crate::node::SchemaNode;
use crate::reduce::LiteralPolicy;
use crate::table::{define_schema, TableSource};

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// convert schema descriptions (JSON) into storage validators
#[derive(Parser, Debug)]
pub struct CommandLineInterface {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// convert each input schema into a single validator
    Convert(ConvertOut),
    /// build table definitions from `{ table: fields | document }` inputs
    Tables(TablesOut),
}

#[derive(Args, Debug, Clone)]
struct InputSettings {
    /// One or more inputs: file paths, directories, or quoted glob patterns
    #[arg(long, short, num_args = 1.., required = true)]
    input: Vec<String>,

    /// keep every distinct literal in unions instead of collapsing them by kind
    #[arg(long, default_value_t = false)]
    keep_literals: bool,
}

#[derive(clap::Parser, Debug)]
struct ConvertOut {
    #[command(flatten)]
    input_settings: InputSettings,

    /// output .json file (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,

    /// single-line JSON
    #[arg(long)]
    compact: bool,

    /// debugging
    #[arg(long)]
    no_op: bool,
}

#[derive(clap::Parser, Debug)]
struct TablesOut {
    #[command(flatten)]
    input_settings: InputSettings,

    /// output .json file (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,

    /// debugging
    #[arg(long)]
    no_op: bool,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl InputSettings {
    fn converter(&self) -> Converter {
        let policy = if self.keep_literals { LiteralPolicy::Preserve } else { LiteralPolicy::CollapseByKind };
        Converter::new(policy)
    }

    /// Load and process every input in parallel; results keep input order.
    fn load_process<T, F>(&self, apply: F) -> Result<Vec<(PathBuf, T)>>
    where
        T: Send,
        F: Fn(&Path) -> Result<T> + Sync,
    {
        let source_paths = resolve_inputs(&self.input)
            .context("failed to resolve input file paths")?;
        tracing::debug!(files = source_paths.len(), "resolved inputs");
        source_paths
            .into_par_iter()
            .map(|path| {
                let out = apply(&path).with_context(|| format!("{}", path.display()))?;
                Ok::<_, anyhow::Error>((path, out))
            })
            .collect()
    }
}

impl CommandLineInterface {
    pub fn load() -> Self {
        Self::parse()
    }

    pub fn run(&self) -> Result<()> {
        match &self.cmd {
            Command::Convert(target) => {
                // debug path
                if target.no_op {
                    eprintln!("{self:#?}");
                    return Ok(());
                }
                let converter = target.input_settings.converter();
                let results = target.input_settings.load_process(|path| {
                    let node: SchemaNode = crate::path_de::from_file_with_path(path)?;
                    Ok(converter.convert(&node, ModifierContext::default())?)
                })?;
                let json = keyed_by_path(results)?;
                let src = if target.compact {
                    serde_json::to_string(&json)?
                } else {
                    serde_json::to_string_pretty(&json)?
                };
                write_output(target.out.as_deref(), &src)
            }
            Command::Tables(target) => {
                // debug path
                if target.no_op {
                    eprintln!("{self:#?}");
                    return Ok(());
                }
                let converter = target.input_settings.converter();
                let results = target.input_settings.load_process(|path| {
                    let tables: IndexMap<String, TableSource> =
                        crate::path_de::from_file_with_path(path)?;
                    Ok(define_schema(&tables, &converter)?)
                })?;
                let json = keyed_by_path(results)?;
                write_output(target.out.as_deref(), &serde_json::to_string_pretty(&json)?)
            }
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

/// One input prints bare; several print as `{ "<path>": ... }`.
fn keyed_by_path<T: serde::Serialize>(mut results: Vec<(PathBuf, T)>) -> Result<serde_json::Value> {
    if results.len() == 1 {
        if let Some((_, only)) = results.pop() {
            return Ok(serde_json::to_value(only)?);
        }
    }
    let mut map = serde_json::Map::new();
    for (path, out) in results {
        map.insert(path.to_string_lossy().to_string(), serde_json::to_value(out)?);
    }
    Ok(serde_json::Value::Object(map))
}

fn write_output(out: Option<&Path>, src: &str) -> Result<()> {
    match out {
        Some(out) => {
            if let Some(parent) = out.parent() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create {}", parent.display()))?;
            }
            std::fs::write(out, src).with_context(|| format!("failed to write {}", out.display()))?;
            tracing::info!(path = %out.display(), "wrote output");
        }
        None => println!("{src}"),
    }
    Ok(())
}

/// Expand `--input` values. A directory stands for the `.json` files directly
/// inside it and a glob for its matches, both sorted; other values pass through
/// as paths. Repeats keep their first position.
fn resolve_inputs<I>(inputs: I) -> Result<Vec<PathBuf>>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    let mut resolved = IndexSet::new();
    for input in inputs {
        let input = input.as_ref();
        let expanded = if Path::new(input).is_dir() {
            let dir = glob::Pattern::escape(input.trim_end_matches('/'));
            expand_glob(&format!("{dir}/*.json"))?
        } else if input.contains(['*', '?', '[']) {
            expand_glob(input)?
        } else {
            vec![PathBuf::from(input)]
        };
        if expanded.is_empty() {
            anyhow::bail!("no schema files match `{input}`");
        }
        resolved.extend(expanded);
    }
    Ok(resolved.into_iter().collect())
}

fn expand_glob(pattern: &str) -> Result<Vec<PathBuf>> {
    let mut paths = glob::glob(pattern)
        .with_context(|| format!("invalid glob `{pattern}`"))?
        .collect::<Result<Vec<_>, _>>()?;
    paths.sort();
    Ok(paths)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_paths_pass_through_once() {
        let paths = resolve_inputs(["a.json", "dir/b.json", "a.json"]).unwrap();
        assert_eq!(paths, vec![PathBuf::from("a.json"), PathBuf::from("dir/b.json")]);
    }

    #[test]
    fn empty_glob_is_an_error() {
        let err = resolve_inputs(["/nonexistent-dir-for-test/*.json"]).unwrap_err();
        assert!(err.to_string().contains("no schema files match"));
    }

    #[test]
    fn directory_expands_to_sorted_json_files() {
        let dir = std::env::temp_dir().join(format!("schema-convex-inputs-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        for name in ["b.json", "a.json", "notes.txt"] {
            std::fs::write(dir.join(name), "{}").unwrap();
        }
        let paths = resolve_inputs([dir.to_string_lossy()]).unwrap();
        std::fs::remove_dir_all(&dir).unwrap();
        assert_eq!(paths, vec![dir.join("a.json"), dir.join("b.json")]);
    }

    #[test]
    fn parses_convert_flags() {
        let cli = CommandLineInterface::try_parse_from([
            "schema-convex", "convert", "-i", "a.json", "b.json", "--keep-literals", "--compact",
        ])
        .unwrap();
        let Command::Convert(target) = cli.cmd else { panic!("expected convert") };
        assert_eq!(target.input_settings.input, ["a.json", "b.json"]);
        assert_eq!(target.input_settings.converter().literal_policy, LiteralPolicy::Preserve);
        assert!(target.compact);
    }

    #[test]
    fn single_result_prints_bare() {
        let json = keyed_by_path(vec![(PathBuf::from("a.json"), 1)]).unwrap();
        assert_eq!(json, serde_json::json!(1));
        let json = keyed_by_path(vec![(PathBuf::from("a.json"), 1), (PathBuf::from("b.json"), 2)]).unwrap();
        assert_eq!(json, serde_json::json!({ "a.json": 1, "b.json": 2 }));
    }
}
