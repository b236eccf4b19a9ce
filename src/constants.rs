// Inference service
pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";
pub const DEFAULT_MODEL: &str = "qwen2.5:7b";
pub const HEALTH_PATH: &str = "/api/tags";
pub const GENERATE_PATH: &str = "/api/generate";
pub const HEALTH_TIMEOUT_MS: u64 = 5000;

// Generation tuning
pub const GEN_TEMPERATURE: f32 = 0.1;
pub const GEN_NUM_PREDICT: u32 = 256;
pub const GEN_TOP_K: u32 = 10;
pub const GEN_TOP_P: f32 = 0.5;
pub const GEN_REPEAT_PENALTY: f32 = 1.1;
pub const GEN_STOP: &[&str] = &["\n\n", "Query:"];

// Result shaping
/// Results returned when the caller does not ask for a specific limit.
pub const DEFAULT_LIMIT: usize = 10;
/// Upper bound on results regardless of the requested limit.
pub const MAX_RESULTS: usize = 12;
/// Score lost per rank position.
pub const RANK_SCORE_STEP: f64 = 0.02;

// Corpus
/// Translations at or below this many characters are placeholders.
pub const MIN_TRANSLATION_LEN: usize = 10;
pub const DEFAULT_DATA_DIR: &str = "data/hadiths";
pub const COLLECTIONS: &[&str] = &[
    "bukhari", "muslim", "abudawud", "tirmidhi", "nasai", "ibnmajah",
];
