//! CLI argument parsing for the canvass-import binary.

use clap::{Parser, Subcommand};

use crate::types::VoterField;

#[derive(Parser)]
#[command(name = "canvass-import", about = "Voter file importer for the Canvass platform")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Submit a voter file and watch the import job to completion
    Import {
        /// Path to the voter file (.csv or .xlsx)
        file: std::path::PathBuf,

        /// Parse and map rows locally and submit JSON instead of uploading
        /// the raw file (legacy path; .csv only, tighter size limits)
        #[arg(long)]
        client_parse: bool,

        /// Override a column mapping, e.g. --map "Reg Number=externalId".
        /// An empty field ignores the column: --map "Reg Number="
        #[arg(long = "map", value_parser = parse_mapping_override)]
        overrides: Vec<MappingOverrideArg>,
    },
    /// Read an import job's status once, or watch it to completion
    Status {
        /// Backend-assigned job id
        job_id: String,

        /// Keep polling until the job reaches a terminal state
        #[arg(long)]
        watch: bool,
    },
    /// Show the cleaned headers and proposed field mapping for a file
    MapPreview {
        /// Path to the voter file (.csv)
        file: std::path::PathBuf,
    },
}

/// One `--map` argument: header name plus target field, or none to ignore.
#[derive(Debug, Clone, PartialEq)]
pub struct MappingOverrideArg {
    pub header: String,
    pub field: Option<VoterField>,
}

fn parse_mapping_override(raw: &str) -> Result<MappingOverrideArg, String> {
    let (header, field_name) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected HEADER=field, got '{raw}'"))?;
    if header.is_empty() {
        return Err("header name must not be empty".to_string());
    }

    let field = match field_name.trim() {
        "" => None,
        name => Some(VoterField::parse(name).ok_or_else(|| {
            format!(
                "unknown field '{name}' (expected one of: {})",
                VoterField::ALL.map(|f| f.as_str()).join(", ")
            )
        })?),
    };

    Ok(MappingOverrideArg {
        header: header.to_string(),
        field,
    })
}
