#![deny(missing_docs)]

//! # Generate Command
//!
//! Loads the API description and the resource configuration, compiles the
//! resource model and writes it out.
//!
//! Without an output directory the whole model goes to stdout. With one, each
//! resource is written to its own `<name>.<ext>` file.

use crate::error::{CliError, CliResult};
use rescomp_core::model::Resource;
use rescomp_core::{compile_model, ApiDocument, GenConfig, Model};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Serialization format of the emitted model.
#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// YAML documents.
    #[default]
    Yaml,
    /// Pretty-printed JSON.
    Json,
}

impl OutputFormat {
    /// File extension for this format.
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Yaml => "yaml",
            OutputFormat::Json => "json",
        }
    }

    fn render_model(self, model: &Model) -> CliResult<String> {
        Ok(match self {
            OutputFormat::Yaml => model.to_yaml()?,
            OutputFormat::Json => model.to_json()?,
        })
    }

    fn render_resource(self, resource: &Resource) -> CliResult<String> {
        Ok(match self {
            OutputFormat::Yaml => serde_yaml::to_string(resource)?,
            OutputFormat::Json => serde_json::to_string_pretty(resource)?,
        })
    }
}

/// Arguments for model generation.
#[derive(clap::Args, Debug, Clone)]
pub struct GenerateArgs {
    /// Path to the OpenAPI description (YAML or JSON).
    #[clap(long, env = "RESCOMP_SPEC")]
    pub spec: PathBuf,

    /// Path to the resource configuration file.
    #[clap(long, env = "RESCOMP_CONFIG")]
    pub config: PathBuf,

    /// Directory receiving one file per resource. Prints to stdout when omitted.
    #[clap(long)]
    pub output: Option<PathBuf>,

    /// Output format.
    #[clap(long, value_enum, default_value_t = OutputFormat::Yaml)]
    pub format: OutputFormat,

    /// Compile only this resource.
    pub resource: Option<String>,
}

/// Executes the generation pipeline.
pub fn execute(args: &GenerateArgs) -> CliResult<()> {
    let model = compile(args)?;
    match &args.output {
        Some(dir) => {
            let written = write_resources(&model, dir, args.format)?;
            tracing::info!(count = written.len(), dir = %dir.display(), "resource files written");
        }
        None => {
            let rendered = args.format.render_model(&model)?;
            std::io::stdout().write_all(rendered.as_bytes())?;
        }
    }
    Ok(())
}

/// Loads both inputs and compiles the requested resources.
pub fn compile(args: &GenerateArgs) -> CliResult<Model> {
    tracing::info!(spec = %args.spec.display(), "loading API description");
    let doc = ApiDocument::from_path(&args.spec)?;
    if let Some(version) = doc.version() {
        tracing::debug!(version, "OpenAPI version");
    }

    tracing::info!(config = %args.config.display(), "loading resource configuration");
    let config = GenConfig::from_path(&args.config)?;
    if config.resources.is_empty() {
        return Err(CliError::General(format!(
            "no resources configured in {}",
            args.config.display()
        )));
    }

    Ok(compile_model(&doc, &config, args.resource.as_deref())?)
}

/// Writes each resource of `model` to `<dir>/<name>.<ext>`, returning the written paths.
pub fn write_resources(model: &Model, dir: &Path, format: OutputFormat) -> CliResult<Vec<PathBuf>> {
    fs::create_dir_all(dir)?;
    let mut written = Vec::with_capacity(model.resources.len());
    for resource in &model.resources {
        let path = dir.join(format!("{}.{}", resource.name, format.extension()));
        fs::write(&path, format.render_resource(resource)?)?;
        tracing::debug!(resource = %resource.name, path = %path.display(), "written");
        written.push(path);
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const SPEC: &str = r#"
openapi: 3.0.1
paths:
  /things:
    post:
      requestBody:
        content:
          application/json:
            schema:
              required: [name]
              properties:
                name: { type: string }
      responses:
        '201':
          content:
            application/json:
              schema:
                properties:
                  id: { type: string }
                  name: { type: string }
  /things/{id}:
    get:
      parameters:
        - name: id
          in: path
          required: true
          schema: { type: string }
      responses:
        '200':
          content:
            application/json:
              schema:
                properties:
                  id: { type: string }
                  name: { type: string }
"#;

    const CONFIG: &str = r#"
resources:
  thing:
    create: { path: /things, method: POST }
    read: { path: "/things/{id}", method: GET }
"#;

    fn args(dir: &Path, output: Option<PathBuf>, format: OutputFormat) -> GenerateArgs {
        let spec = dir.join("openapi.yml");
        let config = dir.join("config.yml");
        fs::write(&spec, SPEC).unwrap();
        fs::write(&config, CONFIG).unwrap();
        GenerateArgs {
            spec,
            config,
            output,
            format,
            resource: None,
        }
    }

    #[test]
    fn test_writes_one_file_per_resource() {
        let dir = tempdir().unwrap();
        let out = dir.path().join("out");
        let args = args(dir.path(), Some(out.clone()), OutputFormat::Json);

        execute(&args).unwrap();

        let content = fs::read_to_string(out.join("thing.json")).unwrap();
        let resource: Resource = serde_json::from_str(&content).unwrap();
        assert_eq!(resource.name, "thing");
        assert_eq!(resource.schema.attributes.names(), vec!["id", "name"]);
    }

    #[test]
    fn test_yaml_files_parse_back() {
        let dir = tempdir().unwrap();
        let args = args(dir.path(), None, OutputFormat::Yaml);
        let model = compile(&args).unwrap();

        let written = write_resources(&model, &dir.path().join("models"), OutputFormat::Yaml).unwrap();
        assert_eq!(written.len(), 1);
        let content = fs::read_to_string(&written[0]).unwrap();
        let resource: Resource = serde_yaml::from_str(&content).unwrap();
        assert_eq!(resource, model.resources[0]);
    }

    #[test]
    fn test_unknown_resource_fails() {
        let dir = tempdir().unwrap();
        let mut args = args(dir.path(), None, OutputFormat::Yaml);
        args.resource = Some("widget".into());
        let err = compile(&args).unwrap_err();
        assert!(matches!(err, CliError::Compile(_)));
    }

    #[test]
    fn test_missing_spec_is_reported() {
        let dir = tempdir().unwrap();
        let mut args = args(dir.path(), None, OutputFormat::Yaml);
        args.spec = dir.path().join("absent.yml");
        assert!(compile(&args).is_err());
    }
}
