//! CLI Argument Parsing
//!
//! CLIの引数解析

use clap::{Parser, Subcommand};

use crate::adapter::config::DEFAULT_CONFIG_PATH;
use crate::domain::entities::schema::Column;
use crate::domain::entities::table::PartitionGranularity;

/// BigQuery のテーブルとクエリを操作するCLI
#[derive(Parser, Debug, Clone)]
#[command(name = "littlebq")]
#[command(about = "Run queries and manage tables in BigQuery", long_about = None)]
pub struct Args {
    /// Config file path
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    pub config: String,

    /// Override the default dataset from the config file
    #[arg(long)]
    pub dataset: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Run a query and print the result table
    Query {
        sql: String,
    },

    /// Create an empty table
    CreateTable {
        name: String,
        /// Column definition as name:TYPE (repeatable)
        #[arg(long = "column", required = true)]
        columns: Vec<Column>,
        /// Partition the new table by day on this TIMESTAMP column
        #[arg(long)]
        partition_column: Option<String>,
    },

    /// Create a table from CSV files in Cloud Storage
    LoadCsv {
        name: String,
        /// gs://bucket/path (wildcards allowed)
        uri: String,
        /// Column definition as name:TYPE (repeatable)
        #[arg(long = "column", required = true)]
        columns: Vec<Column>,
        /// Replace the table contents if it already exists
        #[arg(long)]
        overwrite: bool,
    },

    /// Append CSV files in Cloud Storage to an existing table
    AppendCsv {
        name: String,
        uri: String,
    },

    /// Delete a table
    DropTable {
        name: String,
    },

    /// Describe a table or a partition (name$YYYYMMDD)
    Desc {
        name: String,
    },

    /// Time-partition an existing table on a TIMESTAMP column
    Partition {
        name: String,
        column: String,
        #[arg(long, default_value = "day")]
        by: PartitionGranularity,
    },

    /// List tables in the dataset
    Tables,

    /// List datasets in the project
    Datasets,

    /// Create a dataset
    CreateDataset {
        name: String,
        #[arg(long)]
        description: Option<String>,
    },

    /// Delete a dataset
    DropDataset {
        name: String,
        /// Also delete all tables in the dataset
        #[arg(long)]
        delete_contents: bool,
    },
}
