use std::path::Path;

use crate::io_struct::{BatchReqInput, OptionValue, SingleReqInput};

/// How a single-item request reached the gateway. Query-string transport
/// cannot distinguish a boolean flag from an option with an empty value, so
/// an empty value is treated as a bare flag there. That ambiguity is part of
/// the contract, not something to second-guess.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transport {
    Query,
    Json,
}

/// Keys the gateway consumes itself in batch `common`; everything else is
/// passed through to zint.
const BATCH_RESERVED: &[&str] = &["type", "filetype", "scale", "output_pattern"];

/// Zero-padded numbering width for a batch of `count` items. Matches zint's
/// own batch numbering: at least three digits, more once the count needs
/// them (count=999 -> 3, count=1000 -> 4).
pub fn padding_width(count: usize) -> usize {
    count.to_string().len().max(3)
}

/// Output template filename for a batch run, with one `~` placeholder per
/// numbering digit, e.g. `barcode_~~~.png`.
pub fn output_template_name(pattern: &str, width: usize, ext: &str) -> String {
    format!("{pattern}{}.{ext}", "~".repeat(width))
}

/// Concrete filename zint produces for the `idx`-th item (1-based).
pub fn numbered_name(pattern: &str, idx: usize, width: usize, ext: &str) -> String {
    format!("{pattern}{idx:0width$}.{ext}")
}

fn is_truthy_string(value: &str) -> bool {
    ["true", "1", "yes"]
        .iter()
        .any(|t| value.eq_ignore_ascii_case(t))
}

fn push_passthrough(args: &mut Vec<String>, key: &str, value: &OptionValue, transport: Transport) {
    match (transport, value) {
        (_, OptionValue::Flag(true)) => args.push(format!("--{key}")),
        (_, OptionValue::Flag(false)) => {}
        (Transport::Query, OptionValue::Text(text)) if text.is_empty() => {
            args.push(format!("--{key}"));
        }
        (Transport::Json, OptionValue::Text(text)) if is_truthy_string(text) => {
            args.push(format!("--{key}"));
        }
        _ => {
            args.push(format!("--{key}"));
            args.push(value.render());
        }
    }
}

/// Argument list for a single-item zint invocation writing to `output_path`.
pub fn single_args(req: &SingleReqInput, transport: Transport, output_path: &Path) -> Vec<String> {
    let mut args = vec![
        "--data".to_string(),
        req.data.clone(),
        "--filetype".to_string(),
        req.filetype(),
        "-o".to_string(),
        output_path.display().to_string(),
        "--barcode".to_string(),
        req.symbology(),
    ];
    for (key, value) in &req.extra {
        push_passthrough(&mut args, key, value, transport);
    }
    args
}

/// Argument list for a batch zint invocation reading items from `input_path`
/// and writing numbered files following `output_template`.
pub fn batch_args(req: &BatchReqInput, input_path: &Path, output_template: &Path) -> Vec<String> {
    let mut args = vec![
        "--batch".to_string(),
        "--barcode".to_string(),
        req.symbology(),
        "--filetype".to_string(),
        req.filetype(),
        "--output".to_string(),
        output_template.display().to_string(),
        "--input".to_string(),
        input_path.display().to_string(),
        "--scale".to_string(),
        req.scale(),
    ];
    for (key, value) in &req.common {
        if BATCH_RESERVED.contains(&key.as_str()) {
            continue;
        }
        // Batch common options: bool true is a flag, bool false is dropped,
        // anything else is passed with its value.
        match value {
            OptionValue::Flag(true) => args.push(format!("--{key}")),
            OptionValue::Flag(false) => {}
            other => {
                args.push(format!("--{key}"));
                args.push(other.render());
            }
        }
    }
    args
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::path::PathBuf;

    #[test]
    fn padding_width_boundaries() {
        assert_eq!(padding_width(1), 3);
        assert_eq!(padding_width(99), 3);
        assert_eq!(padding_width(999), 3);
        assert_eq!(padding_width(1000), 4);
        assert_eq!(padding_width(10000), 5);
    }

    #[test]
    fn template_and_numbered_names_agree_on_width() {
        assert_eq!(output_template_name("barcode_", 3, "png"), "barcode_~~~.png");
        assert_eq!(numbered_name("barcode_", 7, 3, "png"), "barcode_007.png");
        assert_eq!(numbered_name("barcode_", 1000, 4, "svg"), "barcode_1000.svg");
    }

    #[test]
    fn single_args_base_tokens_and_defaults() {
        let req = SingleReqInput {
            data: "12345".to_string(),
            ..Default::default()
        };
        let out = PathBuf::from("/tmp/work/barcode.png");
        let args = single_args(&req, Transport::Json, &out);
        assert_eq!(
            args,
            vec![
                "--data",
                "12345",
                "--filetype",
                "PNG",
                "-o",
                "/tmp/work/barcode.png",
                "--barcode",
                "58",
            ]
        );
    }

    #[test]
    fn single_json_flag_coercion() {
        let req: SingleReqInput = serde_json::from_value(json!({
            "data": "x",
            "bold": true,
            "small": "YES",
            "notext": false,
            "scale": 3,
            "fg": "112233",
        }))
        .unwrap();
        let args = single_args(&req, Transport::Json, &PathBuf::from("out.png"));
        let tail = &args[8..];
        // BTreeMap ordering: bold, fg, notext, scale, small
        assert_eq!(
            tail,
            ["--bold", "--fg", "112233", "--scale", "3", "--small"]
        );
    }

    #[test]
    fn single_query_empty_value_is_a_flag() {
        let req = SingleReqInput::from_query(vec![
            ("data".to_string(), "x".to_string()),
            ("bold".to_string(), String::new()),
            ("height".to_string(), "40".to_string()),
        ]);
        let args = single_args(&req, Transport::Query, &PathBuf::from("out.png"));
        let tail = &args[8..];
        assert_eq!(tail, ["--bold", "--height", "40"]);
    }

    #[test]
    fn single_query_truthy_text_keeps_its_value() {
        // Only the empty value means "flag" on the query transport.
        let req = SingleReqInput::from_query(vec![
            ("data".to_string(), "x".to_string()),
            ("bold".to_string(), "true".to_string()),
        ]);
        let args = single_args(&req, Transport::Query, &PathBuf::from("out.png"));
        assert_eq!(&args[8..], ["--bold", "true"]);
    }

    #[test]
    fn batch_args_skip_reserved_keys() {
        let req: BatchReqInput = serde_json::from_value(json!({
            "items": ["a"],
            "common": {
                "type": 13,
                "filetype": "gif",
                "scale": 4,
                "output_pattern": "code_",
                "bold": true,
                "dotty": false,
                "height": 50,
            }
        }))
        .unwrap();
        let args = batch_args(
            &req,
            &PathBuf::from("/w/input.txt"),
            &PathBuf::from("/w/code_~~~.gif"),
        );
        assert_eq!(
            args,
            vec![
                "--batch",
                "--barcode",
                "13",
                "--filetype",
                "GIF",
                "--output",
                "/w/code_~~~.gif",
                "--input",
                "/w/input.txt",
                "--scale",
                "4",
                "--bold",
                "--height",
                "50",
            ]
        );
    }
}
