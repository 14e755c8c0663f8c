use crate::config::toml_config::FinderConfig;
use crate::core::session::Selection;
use crate::domain::model::Variant;
use crate::utils::error::Result;
use clap::{Args, Parser, Subcommand};

#[derive(Debug, Clone, Parser)]
#[command(name = "template-finder")]
#[command(about = "Find templates by language, brand and product group")]
pub struct CliConfig {
    /// Path to a TOML configuration file
    #[arg(short, long)]
    pub config: Option<String>,

    /// Catalog CSV file (overrides [source] path)
    #[arg(short, long)]
    pub source: Option<String>,

    /// Catalog layout: content or image (detected from the header when omitted)
    #[arg(long)]
    pub variant: Option<Variant>,

    /// Field delimiter of the catalog file
    #[arg(long)]
    pub delimiter: Option<String>,

    /// Prefix joined with ImageFile to build image references
    #[arg(long)]
    pub image_base: Option<String>,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON")]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// List the languages present in the catalog
    Languages,
    /// List brands, optionally within one language
    Brands {
        #[arg(short, long)]
        language: Option<String>,
    },
    /// List product groups of a brand
    Groups {
        #[arg(short, long)]
        language: Option<String>,
        #[arg(short, long)]
        brand: String,
    },
    /// Show the templates matching a selection
    Templates {
        #[command(flatten)]
        selection: SelectionArgs,
        /// Print the matched records as JSON
        #[arg(long)]
        json: bool,
    },
    /// Write the matching templates to files
    Export {
        #[command(flatten)]
        selection: SelectionArgs,
        #[arg(short, long, default_value = "./output")]
        out: String,
        /// Bundle everything into a single ZIP archive with this name
        #[arg(long)]
        zip: Option<String>,
    },
    /// Browse the catalog interactively
    Browse {
        #[command(flatten)]
        selection: SelectionArgs,
    },
}

/// Stage picks given on the command line. Missing or invalid picks fall back to the first option.
#[derive(Debug, Clone, Default, Args)]
pub struct SelectionArgs {
    #[arg(short, long)]
    pub language: Option<String>,
    #[arg(short, long)]
    pub brand: Option<String>,
    #[arg(short, long)]
    pub group: Option<String>,
}

impl From<&SelectionArgs> for Selection {
    fn from(args: &SelectionArgs) -> Self {
        Selection {
            language: args.language.clone(),
            brand: args.brand.clone(),
            product_group: args.group.clone(),
        }
    }
}

impl CliConfig {
    /// 讀取 TOML（若有指定）後套用命令列覆蓋設定
    pub fn resolve(&self) -> Result<FinderConfig> {
        let mut config = match &self.config {
            Some(path) => FinderConfig::from_file(path)?,
            None => FinderConfig::default(),
        };
        self.apply_overrides(&mut config);
        Ok(config)
    }

    pub fn apply_overrides(&self, config: &mut FinderConfig) {
        if let Some(source) = &self.source {
            config.source.path = source.clone();
        }
        if let Some(variant) = self.variant {
            config.source.variant = Some(variant);
        }
        if let Some(delimiter) = &self.delimiter {
            config.source.delimiter = Some(delimiter.clone());
        }
        if let Some(image_base) = &self.image_base {
            config.display.image_base = image_base.clone();
        }
    }
}
