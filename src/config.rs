use log::{info, warn};

use crate::error::{Error, Result};
use crate::pairing::ShortReadCutoff;
use crate::pattern::PrimerPatterns;
use crate::primer::{ErrorBudget, PrimerRole, PrimerSpec};
use crate::registry::PrimerRegistry;
use crate::spacer::{SpacerTable, SpacerTables};

/// Primers shorter than this tend to anchor at random positions.
const SHORT_PRIMER_WARNING: usize = 8;

/// Primer-set name that selects explicit primer literals.
pub const OTHER_PRIMER_SET: &str = "OTHER";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrimerChoice {
    Named(String),
    Other { forward: String, reverse: String },
}

impl PrimerChoice {
    /// `OTHER` (any case) takes the explicit literals; any other name is looked
    /// up in the registry and the literals are ignored.
    pub fn from_args(name: &str, forward: Option<&str>, reverse: Option<&str>) -> Result<Self> {
        if !name.eq_ignore_ascii_case(OTHER_PRIMER_SET) {
            return Ok(PrimerChoice::Named(name.to_ascii_uppercase()));
        }
        let forward = forward.ok_or(Error::MissingPrimerLiteral(PrimerRole::Forward))?;
        let reverse = reverse.ok_or(Error::MissingPrimerLiteral(PrimerRole::Reverse))?;
        Ok(PrimerChoice::Other {
            forward: forward.to_ascii_uppercase(),
            reverse: reverse.to_ascii_uppercase(),
        })
    }
}

/// User-facing run options before primer resolution.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub primers: PrimerChoice,
    pub budget: ErrorBudget,
    /// `None` takes the named set's stored length and is an error for
    /// `OTHER`; `Some(0)` is variable.
    pub marker_length: Option<usize>,
    pub spacers: bool,
    /// Explicit short-read cutoff, required when the marker is variable.
    pub min_length: Option<f64>,
    pub compress_output: bool,
}

impl RunConfig {
    pub fn resolve(&self, registry: &PrimerRegistry) -> Result<RunContext> {
        let spec = match &self.primers {
            PrimerChoice::Named(name) => {
                let set = registry.resolve(name)?;
                info!("Primer set is {} (F: {} R: {})", set.name, set.forward, set.reverse);
                PrimerSpec::new(
                    set.forward.as_str(),
                    set.reverse.as_str(),
                    self.marker_length.unwrap_or(set.marker_length),
                )
            }
            PrimerChoice::Other { forward, reverse } => {
                info!("Primer set is {} (F: {} R: {})", OTHER_PRIMER_SET, forward, reverse);
                let marker_length = self.marker_length.ok_or(Error::MissingMarkerLength)?;
                PrimerSpec::new(forward.as_str(), reverse.as_str(), marker_length)
            }
        };

        let ctx = RunContext::new(spec, self.budget, self.min_length, self.spacers)?;
        Ok(ctx.with_compressed_output(self.compress_output))
    }
}

/// Read-only state shared by every read of a run.
#[derive(Debug, Clone)]
pub struct RunContext {
    pub spec: PrimerSpec,
    pub budget: ErrorBudget,
    pub patterns: PrimerPatterns,
    pub cutoff: ShortReadCutoff,
    pub spacers: Option<SpacerTables>,
    pub compress_output: bool,
}

impl RunContext {
    pub fn new(spec: PrimerSpec, budget: ErrorBudget, min_length: Option<f64>, spacers: bool) -> Result<Self> {
        let patterns = PrimerPatterns::compile(&spec, &budget)?;
        let cutoff = ShortReadCutoff::resolve(spec.marker_length, min_length)?;

        for role in [PrimerRole::Forward, PrimerRole::Reverse] {
            let literal = spec.literal(role);
            if literal.len() < SHORT_PRIMER_WARNING {
                warn!(
                    "{} primer {} is very short ({} bp), may anchor at random positions",
                    role,
                    literal,
                    literal.len()
                );
            }
        }
        if spec.is_variable_length() {
            warn!(
                "Marker length is variable: the opposite primer marks the end of each target. \
                 Reads are cut short wherever that primer also occurs inside the target."
            );
        }
        info!(
            "Marker length {}, short-read cutoff {}, spacer filtering {}",
            spec.marker_length,
            cutoff.value(),
            if spacers { "on" } else { "off" }
        );

        let spacers = if spacers { Some(SpacerTables::new()?) } else { None };
        Ok(RunContext {
            spec,
            budget,
            patterns,
            cutoff,
            spacers,
            compress_output: false,
        })
    }

    pub fn with_compressed_output(mut self, compress: bool) -> Self {
        self.compress_output = compress;
        self
    }

    pub fn marker_length(&self) -> usize {
        self.spec.marker_length
    }

    pub fn spacer_table(&self, direction: PrimerRole) -> Option<&SpacerTable> {
        self.spacers.as_ref().map(|tables| tables.get(direction))
    }
}
