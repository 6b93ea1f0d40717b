//! Claim-form extraction: OCR a scanned form 283, have a chat model map the
//! text onto a fixed JSON schema, and score the result against ground truth.

pub mod cleanup;
pub mod extractor;
pub mod ground_truth;
pub mod ocr;
pub mod prompt;
pub mod schema;
pub mod validation;

pub use cleanup::clean_numeric_fields;
pub use extractor::{ExtractedForm, ExtractionSettings, FormExtractor};
pub use ground_truth::{document_stem, ground_truth_path, load_ground_truth};
pub use ocr::{AzureDocumentIntelligence, DocumentKind, OcrOutput, OcrProvider, StaticOcr};
pub use schema::{conform_to_template, detect_record_language, template};
pub use validation::{
    flatten, normalize_keys, unflatten, validate_dynamic, validate_with_ground_truth,
    DynamicReport, GroundTruthReport, MismatchedField,
};
