//! Workflow constants shared across crates.

/// Extensions accepted for the multi-file application submission.
pub const SUBMISSION_ALLOWED_EXTENSIONS: &[&str] = &["pdf", "doc", "docx", "png", "jpg"];

/// Extensions accepted for a plain resume upload.
pub const RESUME_ALLOWED_EXTENSIONS: &[&str] = &["pdf", "doc", "docx"];

/// Payload keys that hold repeating sections; always forwarded as raw JSON
/// arrays, defaulting to an empty array when the client omits them.
pub const LIST_VALUED_KEYS: &[&str] = &["EducationList", "WorkExperienceList", "SkillsList"];

/// Role code selecting HR staff in the recipient query.
pub const HR_STAFF_ROLE: i32 = 2;

/// Bounded retry for the busy/already-connected share failure class.
pub const SHARE_CONNECT_MAX_ATTEMPTS: u32 = 3;

/// Fixed delay between share connection attempts, in milliseconds.
pub const SHARE_CONNECT_RETRY_DELAY_MS: u64 = 2000;
