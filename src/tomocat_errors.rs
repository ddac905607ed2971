use thiserror::Error;

use crate::catalog::reader::ParseCatalogError;

#[derive(Error, Debug)]
pub enum TomocatError {
    #[error("Unable to perform file operation: {0}")]
    IoError(#[from] std::io::Error),

    #[error("HTTP reqwest error: {0}")]
    ReqwestError(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Catalog file not found at: {0}")]
    CatalogFileNotFound(String),

    #[error("Catalog unavailable: download from {0} failed or was incomplete")]
    CatalogUnavailable(String),

    #[error("Error during the src_rec file parsing: {0}")]
    CatalogParsing(#[from] ParseCatalogError),

    #[error("YAML parameter file error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("Invalid weight combination rule: {0} (expected one of: average, multiply)")]
    InvalidWeightRule(String),

    #[error("Invalid weighting target: {0} (expected one of: src, rec)")]
    InvalidWeightTarget(String),

    #[error("Invalid double-difference kind: {0} (expected one of: cs, cr)")]
    InvalidDifferenceKind(String),

    #[error("Invalid noise kind: {0} (expected one of: uniform, gaussian)")]
    InvalidNoiseKind(String),

    #[error("Cannot append a src_only catalog to a catalog with records (or vice versa)")]
    SrcOnlyMismatch,

    #[error("Event not found in catalog: {0}")]
    EventNotFound(String),

    #[error("Source index out of range: {0}")]
    SourceNotFound(usize),

    #[error("Absolute records carry no cached distance/azimuth; run calc_distaz first")]
    MissingDistaz,

    #[error("Gaussian noise generation failed: {0:?}")]
    NoiseInjectionError(rand_distr::NormalError),
}

impl From<rand_distr::NormalError> for TomocatError {
    fn from(err: rand_distr::NormalError) -> Self {
        TomocatError::NoiseInjectionError(err)
    }
}

impl PartialEq for TomocatError {
    fn eq(&self, other: &Self) -> bool {
        use TomocatError::*;
        match (self, other) {
            (InvalidUrl(a), InvalidUrl(b)) => a == b,
            (CatalogFileNotFound(a), CatalogFileNotFound(b)) => a == b,
            (CatalogUnavailable(a), CatalogUnavailable(b)) => a == b,
            (CatalogParsing(a), CatalogParsing(b)) => a == b,
            (InvalidWeightRule(a), InvalidWeightRule(b)) => a == b,
            (InvalidWeightTarget(a), InvalidWeightTarget(b)) => a == b,
            (InvalidDifferenceKind(a), InvalidDifferenceKind(b)) => a == b,
            (InvalidNoiseKind(a), InvalidNoiseKind(b)) => a == b,
            (EventNotFound(a), EventNotFound(b)) => a == b,
            (SourceNotFound(a), SourceNotFound(b)) => a == b,
            (NoiseInjectionError(a), NoiseInjectionError(b)) => a == b,

            // not comparable beyond the variant itself
            (IoError(_), IoError(_)) => true,
            (ReqwestError(_), ReqwestError(_)) => true,
            (YamlError(_), YamlError(_)) => true,

            // unit variants
            (SrcOnlyMismatch, SrcOnlyMismatch) => true,
            (MissingDistaz, MissingDistaz) => true,

            _ => false,
        }
    }
}
