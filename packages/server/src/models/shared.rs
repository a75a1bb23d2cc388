use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Identity document categories accepted by the KYC pipeline.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum DocumentType {
    AadharCard,
    PanCard,
    VoterId,
    CandidatePhoto,
    VoterPhoto,
    AdminPhoto,
}

impl DocumentType {
    /// Document types a user must have on file to pass the KYC check.
    pub const KYC_REQUIRED: [DocumentType; 3] =
        [Self::AadharCard, Self::PanCard, Self::VoterId];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AadharCard => "aadhar_card",
            Self::PanCard => "pan_card",
            Self::VoterId => "voter_id",
            Self::CandidatePhoto => "candidate_photo",
            Self::VoterPhoto => "voter_photo",
            Self::AdminPhoto => "admin_photo",
        }
    }

    pub fn parse(s: &str) -> Result<Self, AppError> {
        match s {
            "aadhar_card" => Ok(Self::AadharCard),
            "pan_card" => Ok(Self::PanCard),
            "voter_id" => Ok(Self::VoterId),
            "candidate_photo" => Ok(Self::CandidatePhoto),
            "voter_photo" => Ok(Self::VoterPhoto),
            "admin_photo" => Ok(Self::AdminPhoto),
            other => Err(AppError::Validation(format!(
                "Invalid document type: {other}"
            ))),
        }
    }
}

/// Camera angle of a proctoring recording.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum CameraType {
    Front,
    Rear,
}

impl CameraType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Front => "front",
            Self::Rear => "rear",
        }
    }

    pub fn parse(s: &str) -> Result<Self, AppError> {
        match s {
            "front" => Ok(Self::Front),
            "rear" => Ok(Self::Rear),
            other => Err(AppError::Validation(format!("Invalid camera type: {other}"))),
        }
    }
}

/// Where a face image was captured from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ExtractedFrom {
    VoterId,
    Live,
}

impl ExtractedFrom {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::VoterId => "voter_id",
            Self::Live => "live",
        }
    }

    pub fn parse(s: &str) -> Result<Self, AppError> {
        match s {
            "voter_id" => Ok(Self::VoterId),
            "live" => Ok(Self::Live),
            other => Err(AppError::Validation(format!(
                "Invalid extraction source: {other}"
            ))),
        }
    }
}

/// Upload lifecycle of a video record.
///
/// `recording` is the initial state; `completed` and `failed` are
/// terminal. Only `completed` records are retrievable.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum VideoStatus {
    Recording,
    Completed,
    Failed,
}

impl VideoStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Recording => "recording",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}
