//! Critical pronoun classification for clause mate extraction.
//!
//! A *critical pronoun* is a German pronoun token that may anchor a clause
//! mate relationship. Membership is decided by literal, case-sensitive
//! comparison against three closed word lists:
//!
//! - **Third person personal**: er, sie, es, ihn, ihm, ihr, ihnen
//! - **D-pronouns**: pronominally used determiners (der, die, das, dessen, ...)
//! - **Demonstratives**: dieser, diese, jener, ...
//!
//! No morphological disambiguation happens here. Forms that are ambiguous
//! between readings ("ihr" as plural second person or feminine dative, "sie"
//! as singular feminine or plural) are always critical.
//!
//! ## Usage
//!
//! ```
//! use clause_mates_pronouns::{CriticalPronounClassifier, PronounClass};
//!
//! let classifier = CriticalPronounClassifier::new();
//! assert_eq!(classifier.classify("er"), Some(PronounClass::ThirdPersonPersonal));
//! assert_eq!(classifier.classify("dessen"), Some(PronounClass::DPronoun));
//! assert!(!classifier.is_critical("Mann"));
//! ```

mod classifier;
mod types;

pub use classifier::{CriticalPronounClassifier, DEMONSTRATIVE, D_PRONOUN, THIRD_PERSON_PERSONAL};
pub use types::PronounClass;
