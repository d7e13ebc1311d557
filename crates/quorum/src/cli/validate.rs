use std::path::Path;

use anyhow::{bail, Result};
use serde_json::Value;

use quorum_core::validate::parse_payload;
use quorum_core::{analyze_and_combine, compare_document_ids, read_json, validate, ValidationOptions};

use super::{fail, file_label, pass, section};

struct Checked<'a> {
    description: &'static str,
    path: &'a Path,
    value: Option<Value>,
    structure_ok: bool,
}

pub fn run(prediction: &Path, reference: &Path, options: ValidationOptions) -> Result<()> {
    let mut files = [
        Checked::new("Prediction", prediction),
        Checked::new("Reference", reference),
    ];
    let mut all_passed = true;

    section("File Validation");
    for file in &mut files {
        all_passed &= file.load();
    }

    section("Structure Validation");
    for file in &mut files {
        all_passed &= file.check_structure(options);
    }

    section("Document ID Comparison");
    all_passed &= compare_ids(&files[0], &files[1]);

    section("Deduplication Analysis");
    for file in &files {
        file.analyze(options);
    }

    eprintln!();
    if !all_passed {
        bail!("validation failed; fix the reported issues before scoring");
    }
    eprintln!("All validations passed");
    Ok(())
}

impl<'a> Checked<'a> {
    fn new(description: &'static str, path: &'a Path) -> Self {
        Self {
            description,
            path,
            value: None,
            structure_ok: false,
        }
    }

    fn load(&mut self) -> bool {
        match read_json(self.path) {
            Ok(value) => {
                pass(format!("{} file is valid JSON ({})", self.description, file_label(self.path)));
                self.value = Some(value);
                true
            }
            Err(e) => {
                fail(format!("{} file: {e}", self.description));
                false
            }
        }
    }

    fn check_structure(&mut self, options: ValidationOptions) -> bool {
        let Some(value) = &self.value else {
            fail(format!("{} file: nothing to validate", self.description));
            return false;
        };
        match validate(value, options) {
            Ok(()) => {
                pass(format!("{} file has correct structure", self.description));
                self.structure_ok = true;
                true
            }
            Err(e) => {
                fail(format!("{} file: {e}", self.description));
                false
            }
        }
    }

    fn analyze(&self, options: ValidationOptions) {
        let Some(value) = self.value.clone().filter(|_| self.structure_ok) else {
            eprintln!("  {} skipped", self.description);
            return;
        };
        let Ok(payload) = parse_payload(value, options) else {
            return;
        };
        let total = analyze_and_combine([&payload]).total;
        eprintln!("  {} ({}):", self.description, file_label(self.path));
        eprintln!(
            "    entities: {} total, {} unique, {} duplicates",
            total.entities_total,
            total.entities_unique,
            total.duplicate_entities()
        );
        eprintln!(
            "    triples:  {} total, {} unique, {} duplicates",
            total.triples_total,
            total.triples_unique,
            total.duplicate_triples()
        );
    }
}

fn compare_ids(prediction: &Checked<'_>, reference: &Checked<'_>) -> bool {
    let (Some(Value::Object(pred)), Some(Value::Object(refr))) = (&prediction.value, &reference.value)
    else {
        fail("Cannot compare document ids: both files must be JSON objects");
        return false;
    };

    let comparison = compare_document_ids(pred.keys(), refr.keys());
    if comparison.is_match() {
        pass("All document ids match between prediction and reference");
        return true;
    }

    if !comparison.missing_in_a.is_empty() {
        fail(format!(
            "In reference but missing in prediction: {}",
            join(&comparison.missing_in_a)
        ));
    }
    if !comparison.missing_in_b.is_empty() {
        fail(format!(
            "In prediction but missing in reference: {}",
            join(&comparison.missing_in_b)
        ));
    }
    false
}

fn join<'a>(ids: impl IntoIterator<Item = &'a String>) -> String {
    ids.into_iter().map(String::as_str).collect::<Vec<_>>().join(", ")
}
