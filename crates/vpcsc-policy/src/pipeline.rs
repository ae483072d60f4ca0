//! # Generation Pipeline
//!
//! Runs one audit log end to end: extraction, ownership, direction,
//! justification, synthesis. The outcome is a [`Generation`] that
//! serializes to the result document consumed by routing:
//!
//! - success: `{success: true, requestSummary, directionInfo, tlmValidation,
//!   reviewNotes, rules}`
//! - failure: `{success: false, error, reason?, help?}`
//!
//! ## Perimeter resolution
//!
//! 1. Perimeters named by the log itself take precedence.
//! 2. Otherwise each side's project number is resolved through the cache
//!    and router table.
//! 3. If neither side resolved and the log names the perimeter where the
//!    violation occurred, that perimeter is used as the destination of an
//!    `INGRESS` violation or the source of an `EGRESS` one. This is recorded
//!    as [`ReviewNote::TargetFromViolationPerimeter`].

use serde::{Deserialize, Serialize};
use vpcsc_core::{
    DirectionDecision, ExtractError, JustificationToken, PerimeterName, ProjectCache,
    ProjectNumber, ReviewNote, RouterTable, Rule, SkipReason, SynthesisError, TlmDecision,
    ViolationRecord, ViolationType,
};

use crate::direction::classify;
use crate::ownership::OwnershipResolver;
use crate::synthesize::synthesize;
use crate::tlm;

// ---------------------------------------------------------------------------
// Result documents
// ---------------------------------------------------------------------------

/// Caller side of the request summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceSummary {
    pub ip: Option<String>,
    #[serde(default)]
    pub is_public: bool,
    pub project: Option<ProjectNumber>,
    pub perimeter: Option<PerimeterName>,
}

/// Target side of the request summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DestinationSummary {
    pub project: Option<ProjectNumber>,
    pub perimeter: Option<PerimeterName>,
}

/// What was requested, as understood after resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestSummary {
    pub source: SourceSummary,
    pub destination: DestinationSummary,
    #[serde(default)]
    pub service: String,
    #[serde(default)]
    pub method: String,
    pub service_account: Option<String>,
}

/// Successful generation.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationReport {
    success: bool,
    pub request_summary: RequestSummary,
    pub direction_info: DirectionDecision,
    pub tlm_validation: TlmDecision,
    pub review_notes: Vec<ReviewNote>,
    pub rules: Vec<Rule>,
}

/// Failed generation. No rules are ever attached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailureReport {
    success: bool,
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub help: Option<String>,
}

impl FailureReport {
    fn new(error: impl Into<String>, reason: Option<String>, help: Option<&str>) -> Self {
        Self {
            success: false,
            error: error.into(),
            reason,
            help: help.map(str::to_string),
        }
    }

    /// The audit log could not be understood.
    pub fn malformed(err: &ExtractError) -> Self {
        Self::new(
            "Invalid audit log JSON",
            Some(err.to_string()),
            Some("Must provide valid JSON audit log from Cloud Logging"),
        )
    }
}

impl From<SynthesisError> for FailureReport {
    fn from(err: SynthesisError) -> Self {
        match err {
            SynthesisError::JustificationRequired { reason } => Self::new(
                "TLM ID required",
                Some(reason),
                Some("Please provide TLM ID using --tlm-id flag"),
            ),
            SynthesisError::Skipped(reason @ SkipReason::BothExternal) => Self::new(
                reason.to_string(),
                None,
                Some("Neither project is owned by a configured perimeter; check the project cache and router table"),
            ),
            SynthesisError::Skipped(reason) => Self::new(reason.to_string(), None, None),
        }
    }
}

/// Outcome of one generation run.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Generation {
    Success(GenerationReport),
    Failure(FailureReport),
}

impl Generation {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// Rules produced; empty on failure.
    pub fn rules(&self) -> &[Rule] {
        match self {
            Self::Success(report) => &report.rules,
            Self::Failure(_) => &[],
        }
    }
}

/// A result document as read back by routing. Accepts both shapes.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RulesDocument {
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub request_summary: Option<RequestSummary>,
    #[serde(default)]
    pub rules: Vec<Rule>,
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

/// Read-only inputs shared by every stage.
#[derive(Debug, Clone, Copy)]
pub struct GenerationContext<'a> {
    pub cache: &'a ProjectCache,
    pub router: &'a RouterTable,
    pub token: Option<&'a JustificationToken>,
}

/// Source/destination perimeters after the resolution fallbacks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPerimeters {
    pub source: Option<PerimeterName>,
    pub dest: Option<PerimeterName>,
    pub notes: Vec<ReviewNote>,
}

/// Run the pipeline on raw audit-log text.
pub fn generate(raw: &str, ctx: GenerationContext<'_>) -> Generation {
    match vpcsc_extract::extract(raw) {
        Ok(record) => generate_for_record(&record, ctx),
        Err(err) => {
            tracing::warn!(error = %err, "audit log rejected");
            Generation::Failure(FailureReport::malformed(&err))
        }
    }
}

/// Run the pipeline on an extracted record.
pub fn generate_for_record(record: &ViolationRecord, ctx: GenerationContext<'_>) -> Generation {
    let resolver = OwnershipResolver::new(ctx.cache, ctx.router);
    let resolved = resolve_perimeters(record, &resolver);
    let decision = classify(resolved.source.as_ref(), resolved.dest.as_ref());
    let tlm_validation = tlm::validate(record, &decision);

    tracing::debug!(
        service = %record.service,
        violation_type = ?record.violation_type,
        source_project = ?record.source_project.as_ref().map(ProjectNumber::as_str),
        dest_project = ?record.dest_project.as_ref().map(ProjectNumber::as_str),
        source_perimeter = ?resolved.source.as_ref().map(PerimeterName::as_str),
        dest_perimeter = ?resolved.dest.as_ref().map(PerimeterName::as_str),
        direction = %decision.direction(),
        public_ip = record.is_public_ip,
        caller_ip = ?record.caller_ip,
        tlm_required = tlm_validation.is_required(),
        "direction detection"
    );

    let rules = match synthesize(record, &decision, ctx.token) {
        Ok(rules) => rules,
        Err(err) => {
            tracing::info!(error = %err, "no rules generated");
            return Generation::Failure(err.into());
        }
    };
    tracing::info!(
        rules = rules.len(),
        direction = %decision.direction(),
        "rules generated"
    );

    Generation::Success(GenerationReport {
        success: true,
        request_summary: RequestSummary {
            source: SourceSummary {
                ip: record.caller_ip.clone(),
                is_public: record.is_public_ip,
                project: record.source_project.clone(),
                perimeter: resolved.source.clone(),
            },
            destination: DestinationSummary {
                project: record.dest_project.clone(),
                perimeter: resolved.dest.clone(),
            },
            service: record.service.clone(),
            method: record.method.clone(),
            service_account: record.principal.clone(),
        },
        direction_info: decision,
        tlm_validation,
        review_notes: resolved.notes,
        rules,
    })
}

/// Apply the perimeter resolution order described in the module docs.
pub fn resolve_perimeters(
    record: &ViolationRecord,
    resolver: &OwnershipResolver<'_>,
) -> ResolvedPerimeters {
    let mut notes = record.review_notes.clone();
    let mut source = record
        .source_perimeter
        .clone()
        .or_else(|| record.source_project.as_ref().and_then(|p| resolver.resolve(p)));
    let mut dest = record
        .dest_perimeter
        .clone()
        .or_else(|| record.dest_project.as_ref().and_then(|p| resolver.resolve(p)));

    if source.is_none() && dest.is_none() {
        if let Some(at_violation) = &record.perimeter_at_violation {
            let target = match record.violation_type {
                Some(ViolationType::Ingress) => Some(&mut dest),
                Some(ViolationType::Egress) => Some(&mut source),
                _ => None,
            };
            if let Some(slot) = target {
                *slot = Some(at_violation.clone());
                notes.push(ReviewNote::TargetFromViolationPerimeter);
            }
        }
    }

    ResolvedPerimeters { source, dest, notes }
}
