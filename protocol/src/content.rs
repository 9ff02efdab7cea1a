//! # Composite Content Encryption
//!
//! Campaigns and responses are structured objects, and they go on the
//! ledger **field by field**: each title, description, question prompt,
//! option label, and answer is its own [`EncryptedBlob`] with its own
//! fresh salt and IV. Two reasons this is not one big blob:
//!
//! - The on-ledger object layout keeps its shape. Observers can see that
//!   a campaign has three questions with four options each; they just
//!   can't read any of the text. The platform's list views rely on that.
//! - A field can be re-rendered (or lazily decrypted) independently.
//!
//! Decryption of a composite is all-or-nothing. A campaign where the
//! title decrypts but question two does not is not "mostly readable", it
//! is corrupt or keyed wrong, and the caller gets an error, not a partial
//! object.

use serde::{Deserialize, Serialize};

use crate::crypto::envelope::{decrypt, encrypt, EncryptedBlob, EncryptionError};

// ---------------------------------------------------------------------------
// Plaintext shapes
// ---------------------------------------------------------------------------

/// One question in a campaign.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionContent {
    /// The question text.
    pub prompt: String,
    /// The selectable option labels.
    pub options: Vec<String>,
}

/// The human-readable content of a campaign.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CampaignContent {
    /// Campaign title.
    pub title: String,
    /// Campaign description.
    pub description: String,
    /// The questions, in presentation order.
    pub questions: Vec<QuestionContent>,
}

/// A participant's answers, one per question, in question order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseAnswers {
    /// Answer texts (an option label or free text, per question type).
    pub answers: Vec<String>,
}

// ---------------------------------------------------------------------------
// Encrypted shapes
// ---------------------------------------------------------------------------

/// An encrypted question: same shape, opaque texts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedQuestion {
    /// Encrypted question text.
    pub prompt: EncryptedBlob,
    /// Encrypted option labels.
    pub options: Vec<EncryptedBlob>,
}

/// An encrypted campaign, ready for the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedCampaign {
    /// Encrypted title.
    pub title: EncryptedBlob,
    /// Encrypted description.
    pub description: EncryptedBlob,
    /// Encrypted questions.
    pub questions: Vec<EncryptedQuestion>,
}

/// An encrypted response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedResponse {
    /// Encrypted answers, in question order.
    pub answers: Vec<EncryptedBlob>,
}

// ---------------------------------------------------------------------------
// Encrypt / Decrypt
// ---------------------------------------------------------------------------

/// Encrypt a campaign field-by-field under the campaign password.
pub fn encrypt_campaign(
    content: &CampaignContent,
    password: &str,
) -> Result<EncryptedCampaign, EncryptionError> {
    let mut questions = Vec::with_capacity(content.questions.len());
    for question in &content.questions {
        let mut options = Vec::with_capacity(question.options.len());
        for option in &question.options {
            options.push(encrypt(option, password)?);
        }
        questions.push(EncryptedQuestion {
            prompt: encrypt(&question.prompt, password)?,
            options,
        });
    }
    Ok(EncryptedCampaign {
        title: encrypt(&content.title, password)?,
        description: encrypt(&content.description, password)?,
        questions,
    })
}

/// Decrypt a campaign. Fails as a whole if any single field fails.
pub fn decrypt_campaign(
    encrypted: &EncryptedCampaign,
    password: &str,
) -> Result<CampaignContent, EncryptionError> {
    let mut questions = Vec::with_capacity(encrypted.questions.len());
    for question in &encrypted.questions {
        let mut options = Vec::with_capacity(question.options.len());
        for option in &question.options {
            options.push(decrypt(option, password)?);
        }
        questions.push(QuestionContent {
            prompt: decrypt(&question.prompt, password)?,
            options,
        });
    }
    Ok(CampaignContent {
        title: decrypt(&encrypted.title, password)?,
        description: decrypt(&encrypted.description, password)?,
        questions,
    })
}

/// Encrypt a response's answers field-by-field.
pub fn encrypt_response(
    answers: &ResponseAnswers,
    password: &str,
) -> Result<EncryptedResponse, EncryptionError> {
    let mut encrypted = Vec::with_capacity(answers.answers.len());
    for answer in &answers.answers {
        encrypted.push(encrypt(answer, password)?);
    }
    Ok(EncryptedResponse { answers: encrypted })
}

/// Decrypt a response. All answers or none.
pub fn decrypt_response(
    encrypted: &EncryptedResponse,
    password: &str,
) -> Result<ResponseAnswers, EncryptionError> {
    let mut answers = Vec::with_capacity(encrypted.answers.len());
    for answer in &encrypted.answers {
        answers.push(decrypt(answer, password)?);
    }
    Ok(ResponseAnswers { answers })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn campaign() -> CampaignContent {
        CampaignContent {
            title: "Validator budget 2026".into(),
            description: "Quarterly allocation vote".into(),
            questions: vec![
                QuestionContent {
                    prompt: "Increase the infra budget?".into(),
                    options: vec!["yes".into(), "no".into(), "abstain".into()],
                },
                QuestionContent {
                    prompt: "Preferred region".into(),
                    options: vec!["eu".into(), "us".into()],
                },
            ],
        }
    }

    #[test]
    fn campaign_roundtrip() {
        let encrypted = encrypt_campaign(&campaign(), "pw").unwrap();
        let decrypted = decrypt_campaign(&encrypted, "pw").unwrap();
        assert_eq!(decrypted, campaign());
    }

    #[test]
    fn structure_is_visible_content_is_not() {
        let encrypted = encrypt_campaign(&campaign(), "pw").unwrap();
        // Shape survives encryption.
        assert_eq!(encrypted.questions.len(), 2);
        assert_eq!(encrypted.questions[0].options.len(), 3);
        // Text does not.
        assert_ne!(encrypted.title.encode(), "Validator budget 2026");
    }

    #[test]
    fn every_field_gets_its_own_salt() {
        let encrypted = encrypt_campaign(&campaign(), "pw").unwrap();
        assert_ne!(encrypted.title.salt(), encrypted.description.salt());
        assert_ne!(
            encrypted.questions[0].prompt.salt(),
            encrypted.questions[1].prompt.salt()
        );
        assert_ne!(
            encrypted.questions[0].options[0].salt(),
            encrypted.questions[0].options[1].salt()
        );
    }

    #[test]
    fn wrong_password_fails_whole_campaign() {
        let encrypted = encrypt_campaign(&campaign(), "pw").unwrap();
        assert!(matches!(
            decrypt_campaign(&encrypted, "wrong"),
            Err(EncryptionError::Integrity)
        ));
    }

    #[test]
    fn one_corrupt_field_fails_whole_campaign() {
        // Partial success is not a valid state: a campaign with one
        // unreadable question is an error, not a shorter campaign.
        let mut encrypted = encrypt_campaign(&campaign(), "pw").unwrap();
        let good = encrypt_campaign(&campaign(), "other-password").unwrap();
        encrypted.questions[1].prompt = good.questions[1].prompt.clone();

        assert!(matches!(
            decrypt_campaign(&encrypted, "pw"),
            Err(EncryptionError::Integrity)
        ));
    }

    #[test]
    fn response_roundtrip() {
        let answers = ResponseAnswers {
            answers: vec!["yes".into(), "eu".into()],
        };
        let encrypted = encrypt_response(&answers, "pw").unwrap();
        assert_eq!(decrypt_response(&encrypted, "pw").unwrap(), answers);
    }

    #[test]
    fn response_wrong_password_fails_closed() {
        let answers = ResponseAnswers {
            answers: vec!["yes".into()],
        };
        let encrypted = encrypt_response(&answers, "pw").unwrap();
        assert!(decrypt_response(&encrypted, "nope").is_err());
    }

    #[test]
    fn encrypted_campaign_serde_roundtrip() {
        let encrypted = encrypt_campaign(&campaign(), "pw").unwrap();
        let json = serde_json::to_string(&encrypted).unwrap();
        let back: EncryptedCampaign = serde_json::from_str(&json).unwrap();
        assert_eq!(decrypt_campaign(&back, "pw").unwrap(), campaign());
    }
}
