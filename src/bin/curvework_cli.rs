use curvework::{CurveKind, Identity, WorkState};
use curvework::geom::GeomMesh;
use curvework::overrides::CurveOverrides;
use curvework::sample::{self, SampleInputs};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

fn main() {
    if let Err(err) = run() {
        eprintln!("curvework_cli error: {err}");
        std::process::exit(1);
    }
}

const USAGE: &str = r#"curvework_cli (curvework)

USAGE:
  curvework_cli list [--state <json>]
  curvework_cli run [options]

OPTIONS (run):
  --inputs <json>        Sample inputs (parameter, overrides, options); defaults when omitted
  --state <json>         Previously persisted state; empty when omitted
  --out-dir <dir>        Write <kind>_<slot>_<identity>.obj per entity and masses.obj
  --write-state <json>   Write the reconciled state for the next run
  --overwrite            Overwrite existing output files
  -v, --verbose          Debug logging (RUST_LOG still takes precedence)
  -h, --help             Show this help
"#;

fn run() -> Result<(), String> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let mut args = Args::new(args);

    let Some(command) = args.next() else {
        print_usage();
        return Ok(());
    };

    match command.as_str() {
        "list" => cmd_list(&mut args),
        "run" => cmd_run(&mut args),
        "-h" | "--help" | "help" => {
            print_usage();
            Ok(())
        }
        other => Err(format!("unknown command `{other}`\n\n{USAGE}")),
    }
}

fn print_usage() {
    println!("{USAGE}");
}

fn init_logger(verbose: bool) {
    let level = if verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}

fn cmd_list(args: &mut Args) -> Result<(), String> {
    let mut state_path: Option<PathBuf> = None;
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--state" => state_path = Some(PathBuf::from(args.value("--state")?)),
            other => return Err(format!("unknown option `{other}`\n\n{USAGE}")),
        }
    }

    match state_path {
        Some(path) => {
            let state: WorkState = read_json(&path)?;
            for entity in state.entities() {
                println!("{}\t{}\t(from {})", entity.kind(), entity.id(), entity.source_id());
            }
        }
        None => {
            let examples = sample::example_overrides();
            print_additions("circle", examples.circles.additions.iter().map(|a| &a.identity));
            print_additions("arc", examples.arcs.additions.iter().map(|a| &a.identity));
            print_additions("bezier", examples.beziers.additions.iter().map(|a| &a.identity));
            print_additions("line", examples.lines.additions.iter().map(|a| &a.identity));
            print_additions("polyline", examples.polylines.additions.iter().map(|a| &a.identity));
        }
    }
    Ok(())
}

fn print_additions<'a>(kind: &str, identities: impl Iterator<Item = &'a Identity>) {
    for identity in identities {
        println!("{kind}\t{identity}\t(example)");
    }
}

fn cmd_run(args: &mut Args) -> Result<(), String> {
    let mut inputs_path: Option<PathBuf> = None;
    let mut state_path: Option<PathBuf> = None;
    let mut out_dir: Option<PathBuf> = None;
    let mut write_state: Option<PathBuf> = None;
    let mut overwrite = false;
    let mut verbose = false;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--inputs" => inputs_path = Some(PathBuf::from(args.value("--inputs")?)),
            "--state" => state_path = Some(PathBuf::from(args.value("--state")?)),
            "--out-dir" => out_dir = Some(PathBuf::from(args.value("--out-dir")?)),
            "--write-state" => write_state = Some(PathBuf::from(args.value("--write-state")?)),
            "--overwrite" => overwrite = true,
            "-v" | "--verbose" => verbose = true,
            "-h" | "--help" => {
                print_usage();
                return Ok(());
            }
            other => return Err(format!("unknown option `{other}`\n\n{USAGE}")),
        }
    }

    init_logger(verbose);

    let inputs: SampleInputs = match inputs_path.as_deref() {
        Some(path) => read_json(path)?,
        None => SampleInputs::default(),
    };
    let state: WorkState = match state_path.as_deref() {
        Some(path) => read_json(path)?,
        None => WorkState::new(),
    };

    if inputs.overrides == CurveOverrides::default() {
        log::debug!("no host overrides; running examples only");
    }

    let output = sample::execute(&inputs, &state).map_err(|e| e.to_string())?;

    for failure in &output.synthesis.failures {
        eprintln!("{} `{}`: {}", failure.kind, failure.identity, failure.error);
    }

    for entity in output.state.entities() {
        match entity.representation() {
            Some(rep) => eprintln!(
                "{} `{}`: vertices={} triangles={} markers={} | {}",
                entity.kind(),
                entity.id(),
                rep.mesh.vertex_count(),
                rep.mesh.triangle_count(),
                rep.markers.len(),
                rep.diagnostics.summary()
            ),
            None => eprintln!("{} `{}`: no representation", entity.kind(), entity.id()),
        }
    }

    if let Some(dir) = out_dir.as_deref() {
        fs::create_dir_all(dir).map_err(|e| format!("create out dir: {e}"))?;

        for collection in output.state.collections() {
            for (slot, entity) in collection.iter().enumerate() {
                let Some(rep) = entity.representation() else {
                    continue;
                };
                let name = entity_object_name(entity.kind(), slot, entity.id());
                let path = dir.join(format!("{name}.obj"));
                write_obj_file(&path, &[(name.as_str(), &rep.mesh)], overwrite)?;
                eprintln!("wrote {}", path.display());
            }
        }

        let names: Vec<String> = output
            .masses
            .iter()
            .enumerate()
            .map(|(i, mass)| format!("mass_{i}_{}", file_stem(&mass.material.name)))
            .collect();
        let objects: Vec<(&str, &GeomMesh)> = names
            .iter()
            .zip(&output.masses)
            .map(|(name, mass)| (name.as_str(), &mass.mesh))
            .collect();
        let path = dir.join("masses.obj");
        write_obj_file(&path, &objects, overwrite)?;
        eprintln!("wrote {}", path.display());
    }

    if let Some(path) = write_state.as_deref() {
        let json = serde_json::to_string_pretty(&output.state)
            .map_err(|e| format!("serialize state: {e}"))?;
        write_text_file(path, &json, overwrite)?;
        eprintln!("wrote {}", path.display());
    }

    if output.synthesis.is_success() {
        Ok(())
    } else {
        Err(format!(
            "{} representations failed",
            output.synthesis.failures.len()
        ))
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, String> {
    let text = fs::read_to_string(path).map_err(|e| format!("read {}: {e}", path.display()))?;
    serde_json::from_str(&text).map_err(|e| format!("parse {}: {e}", path.display()))
}

/// `<kind>_<slot>_<identity>`; the slot keeps names unique when sanitized
/// identities collide.
fn entity_object_name(kind: CurveKind, slot: usize, identity: &Identity) -> String {
    format!("{kind}_{slot}_{}", file_stem(identity.as_str()))
}

fn file_stem(raw: &str) -> String {
    raw.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
        .collect()
}

fn ensure_writable(path: &Path, overwrite: bool) -> Result<(), String> {
    if path.exists() && !overwrite {
        return Err(format!(
            "refusing to overwrite existing file {} (use --overwrite)",
            path.display()
        ));
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| format!("create dir {}: {e}", parent.display()))?;
    }
    Ok(())
}

fn write_text_file(path: &Path, text: &str, overwrite: bool) -> Result<(), String> {
    ensure_writable(path, overwrite)?;
    let mut text = text.replace("\r\n", "\n");
    if !text.ends_with('\n') {
        text.push('\n');
    }
    fs::write(path, text).map_err(|e| format!("write {}: {e}", path.display()))
}

/// One OBJ with an `o` block per mesh; indices are offset across blocks.
fn write_obj_file(path: &Path, objects: &[(&str, &GeomMesh)], overwrite: bool) -> Result<(), String> {
    for (name, mesh) in objects {
        mesh.validate()
            .map_err(|e| format!("mesh `{name}` validation failed: {e}"))?;
    }
    ensure_writable(path, overwrite)?;

    let file = File::create(path).map_err(|e| format!("create {}: {e}", path.display()))?;
    let mut w = BufWriter::new(file);

    writeln!(w, "# curvework curvework_cli").map_err(|e| format!("write obj: {e}"))?;

    let mut offset = 1u32;
    for (name, mesh) in objects {
        writeln!(w, "o {name}").map_err(|e| format!("write obj: {e}"))?;

        for p in mesh.positions.iter().copied() {
            writeln!(w, "v {} {} {}", p[0], p[1], p[2]).map_err(|e| format!("write obj: {e}"))?;
        }

        if let Some(normals) = mesh.normals.as_ref() {
            for n in normals.iter().copied() {
                writeln!(w, "vn {} {} {}", n[0], n[1], n[2]).map_err(|e| format!("write obj: {e}"))?;
            }
        }

        let has_normals = mesh.normals.is_some();
        for tri in mesh.indices.chunks_exact(3) {
            let a = tri[0] + offset;
            let b = tri[1] + offset;
            let c = tri[2] + offset;

            if has_normals {
                writeln!(w, "f {a}//{a} {b}//{b} {c}//{c}")
            } else {
                writeln!(w, "f {a} {b} {c}")
            }
            .map_err(|e| format!("write obj: {e}"))?;
        }

        offset += mesh.positions.len() as u32;
    }

    w.flush().map_err(|e| format!("flush {}: {e}", path.display()))
}

struct Args {
    args: Vec<String>,
    pos: usize,
}

impl Args {
    fn new(args: Vec<String>) -> Self {
        Self { args, pos: 0 }
    }

    fn next(&mut self) -> Option<String> {
        let arg = self.args.get(self.pos)?.clone();
        self.pos += 1;
        Some(arg)
    }

    fn value(&mut self, flag: &str) -> Result<String, String> {
        self.next()
            .ok_or_else(|| format!("missing value for {flag}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn colliding_identities_get_distinct_file_names() {
        let spaced = entity_object_name(CurveKind::Polyline, 0, &Identity::from("a b"));
        let underscored = entity_object_name(CurveKind::Polyline, 1, &Identity::from("a_b"));
        assert_eq!(spaced, "polyline_0_a_b");
        assert_eq!(underscored, "polyline_1_a_b");
        assert_ne!(spaced, underscored);
    }

    #[test]
    fn args_report_missing_values() {
        let mut args = Args::new(vec!["--state".to_string()]);
        assert_eq!(args.next().as_deref(), Some("--state"));
        assert!(args.value("--state").is_err());
    }
}
