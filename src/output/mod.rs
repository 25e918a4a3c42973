pub mod formatter;

pub use formatter::{
    format_json, format_ranked_table, format_score, format_tsv, format_value, format_weights,
    should_use_colors,
};
