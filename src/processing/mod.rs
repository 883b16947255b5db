pub mod decoder;
pub mod image;
pub mod normalizer;
pub mod ocr;
pub mod ocr_space;
pub mod sanitizer;

pub use decoder::MrzDecoder;
pub use self::image::ImageProcessor;
pub use normalizer::{FieldNormalizer, GivenNamePolicy, DEFAULT_CENTURY_PIVOT};
pub use ocr::{OcrOutput, OcrProvider, TesseractProvider};
pub use ocr_space::OcrSpaceProvider;
pub use sanitizer::LineSanitizer;
