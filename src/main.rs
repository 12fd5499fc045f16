use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::{info, warn};
use std::collections::BTreeMap;
use std::io::Read;
use std::path::{Path, PathBuf};
use stitchgen::config::{parse_assignment, ConfigError, ProjectConfig, DEFAULT_CONFIG_FILE};
use stitchgen::{Materializer, Placeholders, PreviewTree, Report, Template};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Path to the YAML project file (defaults to ./stitchgen.yaml when present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Template document to apply, JSON or YAML; `-` reads it from stdin
    #[arg(short, long = "template", global = true)]
    templates: Vec<String>,

    /// Placeholder value as KEY=VALUE; casing variants are derived from it
    #[arg(short, long = "set", global = true, value_parser = parse_set)]
    set: Vec<(String, String)>,

    /// Output root (overrides config if provided)
    #[arg(short, long, global = true)]
    output: Option<PathBuf>,

    /// Dry run mode - don't write files
    #[arg(long, global = true)]
    dry_run: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a new stitchgen project
    Init {
        /// Project directory
        #[arg(default_value = ".")]
        path: PathBuf,
    },
    /// Generate and merge files from templates (default command)
    Generate,
    /// Show the files a generate run would create or modify
    Preview,
}

fn parse_set(s: &str) -> std::result::Result<(String, String), ConfigError> {
    parse_assignment(s)
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Init { path }) => {
            init_project(&path)?;
        }
        Some(Commands::Preview) => {
            generate(cli, true)?;
        }
        Some(Commands::Generate) | None => {
            generate(cli, false)?;
        }
    }

    Ok(())
}

fn init_project(path: &Path) -> Result<()> {
    info!("Initializing stitchgen project at {:?}", path);

    std::fs::create_dir_all(path.join("templates"))?;

    let config_content = r#"output: "."

placeholders:
  Name: "BlogPost"

merge:
  cleanup: true
  seed_indexer_markers: true

templates:
  - name: "schema"
    path: "templates/schema.json"
    output: "schemas"
    enabled: true
"#;
    std::fs::write(path.join(DEFAULT_CONFIG_FILE), config_content)?;

    let template_content = r#"{
  "filePaths": [
    {
      "path": ".",
      "nodes": [
        {
          "name": "{{.NameKebabCase}}.ts",
          "code": "export const {{.NameCamelCase}} = {\n  name: '{{.NameCamelCase}}',\n  id: '{{.NameUuid}}',\n}\n"
        },
        {
          "name": "index.ts",
          "isIndexer": true,
          "code": "// START OF IMPORTS\nimport { {{.NameCamelCase}} } from './{{.NameKebabCase}}'\n// END OF IMPORTS\n// ADD IMPORTS BELOW\n\nexport const schemaTypes = [\n  // START OF VALUE\n  {{.NameCamelCase}},\n  // END OF VALUE\n  // ADD VALUE BELOW\n]\n"
        }
      ]
    }
  ]
}
"#;
    std::fs::write(path.join("templates/schema.json"), template_content)?;

    info!("✓ Project initialized successfully!");
    info!("  Run: stitchgen --set Name=Author");

    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<(ProjectConfig, PathBuf)> {
    let path = match path {
        Some(path) => path.to_path_buf(),
        None if Path::new(DEFAULT_CONFIG_FILE).exists() => PathBuf::from(DEFAULT_CONFIG_FILE),
        None => return Ok((ProjectConfig::default(), PathBuf::from("."))),
    };
    info!("Loading config from {:?}", path);
    let config = ProjectConfig::load(&path).context("Failed to load config")?;
    let base = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."))
        .to_path_buf();
    Ok((config, base))
}

fn read_template(arg: &str) -> Result<Template> {
    if arg == "-" {
        let mut bytes = Vec::new();
        std::io::stdin()
            .read_to_end(&mut bytes)
            .context("Failed to read template from stdin")?;
        return Template::from_slice(&bytes).context("Failed to parse template from stdin");
    }
    Template::load(Path::new(arg)).with_context(|| format!("Failed to load template {}", arg))
}

fn generate(cli: Cli, preview: bool) -> Result<()> {
    let (config, base) = load_config(cli.config.as_deref())?;

    let output_root = cli.output.clone().unwrap_or_else(|| match &config.output {
        Some(output) => base.join(output),
        None => PathBuf::from("."),
    });

    let mut values: BTreeMap<String, String> = config.placeholders.clone();
    values.extend(cli.set.iter().cloned());
    if values.is_empty() {
        warn!("No placeholder values given; {{{{.Key}}}} tokens will be left as-is");
    }
    let placeholders = Placeholders::from_primary(values);

    let mut jobs: Vec<(Template, PathBuf)> = Vec::new();
    if cli.templates.is_empty() {
        for (path, output) in config.enabled_templates(&base) {
            let template = Template::load(&path)
                .with_context(|| format!("Failed to load template {:?}", path))?;
            let root = match output {
                Some(output) => output_root.join(output),
                None => output_root.clone(),
            };
            jobs.push((template, root));
        }
    } else {
        for arg in &cli.templates {
            jobs.push((read_template(arg)?, output_root.clone()));
        }
    }
    if jobs.is_empty() {
        anyhow::bail!("No templates to apply; pass --template or list templates in the config");
    }

    let dry_run = cli.dry_run || preview;
    if dry_run {
        info!("=== DRY RUN MODE - No files will be written ===");
    }
    let materializer = Materializer::new(placeholders, dry_run).with_merge_config(config.merge);

    let mut report = Report::default();
    for (template, root) in &jobs {
        info!("Materializing {} file(s) under {:?}", template.file_count(), root);
        let result = materializer
            .run(template, root)
            .with_context(|| format!("Failed to materialize templates under {:?}", root))?;
        report.extend(result);
    }

    if preview {
        let root = std::env::current_dir()?.join(&output_root);
        let tree = PreviewTree::from_paths(
            report
                .touched()
                .map(|c| c.path.strip_prefix(&root).unwrap_or(c.path.as_path())),
        );
        print!("{}", tree.render(&output_root.display().to_string()));
    } else {
        for path in report.touched_paths() {
            println!("{}", path.display());
        }
    }

    if dry_run {
        info!("=== DRY RUN COMPLETE ===");
    }

    Ok(())
}
