use access_guard::AdmissionDecision;
use prometheus::{Encoder, IntCounterVec, Opts, Registry, TextEncoder};
use reaction_ledger::Rejection;
use storefront_core::SubjectKind;

pub struct StorefrontMetrics {
    pub admission_decisions_total: IntCounterVec,
    pub reaction_toggles_total: IntCounterVec,
    registry: Registry,
}

/// Label for a toggle result: `liked`, `unliked`, or the rejection reason.
pub fn toggle_outcome(result: &Result<bool, Rejection>) -> String {
    match result {
        Ok(true) => "liked".to_string(),
        Ok(false) => "unliked".to_string(),
        Err(rejection) => rejection.to_string(),
    }
}

impl StorefrontMetrics {
    pub fn new(registry: &Registry) -> prometheus::Result<Self> {
        let admission_decisions_total = IntCounterVec::new(
            Opts::new(
                "storefront_admission_decisions_total",
                "Admission decisions issued by view guards",
            ),
            &["decision"],
        )?;
        registry.register(Box::new(admission_decisions_total.clone()))?;

        let reaction_toggles_total = IntCounterVec::new(
            Opts::new(
                "storefront_reaction_toggles_total",
                "Reaction toggles by subject kind and outcome",
            ),
            &["kind", "outcome"],
        )?;
        registry.register(Box::new(reaction_toggles_total.clone()))?;

        Ok(Self {
            admission_decisions_total,
            reaction_toggles_total,
            registry: registry.clone(),
        })
    }

    pub fn observe_admission(&self, decision: &AdmissionDecision) {
        self.admission_decisions_total
            .with_label_values(&[decision.label()])
            .inc();
    }

    pub fn observe_toggle(&self, kind: SubjectKind, result: &Result<bool, Rejection>) {
        let outcome = toggle_outcome(result);
        self.reaction_toggles_total
            .with_label_values(&[kind.as_str(), outcome.as_str()])
            .inc();
    }

    /// Prometheus text exposition of everything in the registry.
    pub fn render(&self) -> prometheus::Result<String> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|err| prometheus::Error::Msg(err.to_string()))
    }
}
