//! State engine dispatcher.
//!
//! Resolves every requested state against the registry before computing
//! anything, runs the modules in request order against one shared federal
//! result, and merges their graphs behind the federal graph.

use serde::Serialize;
use tracing::{debug, debug_span, info};
use uuid::Uuid;

use ttx_config::FederalTables;
use ttx_money::validate_residency_window;
use ttx_provenance::{ElisionPolicy, ProvenanceGraph};
use ttx_schemas::{FederalResult, StateReturnConfig, TaxpayerModel};
use ttx_states::{StateCode, StateComputeResult, StateModule, StateRulesModule};

use crate::{EngineError, ModuleRegistry};

/// One computed return.  Never mutated after construction.
#[derive(Debug, Clone, Serialize)]
pub struct ReturnComputation {
    pub run_id: Uuid,
    pub federal: FederalResult,
    /// In the order the taxpayer requested them.
    pub states: Vec<StateComputeResult>,
    /// Complete graph: federal first, then each state in request order.
    #[serde(skip)]
    pub provenance: ProvenanceGraph,
}

impl ReturnComputation {
    /// Presentation view of the provenance graph.  The complete graph is
    /// kept, so switching policy never recomputes anything.
    pub fn provenance_view(&self, policy: ElisionPolicy) -> ProvenanceGraph {
        self.provenance.elided(policy)
    }

    pub fn state(&self, code: StateCode) -> Option<&StateComputeResult> {
        self.states.iter().find(|s| s.state_code == code)
    }
}

/// Look up every requested module and validate every residency window
/// before anything is computed.
fn resolve<'a>(
    registry: &'a ModuleRegistry,
    requests: &'a [StateReturnConfig],
) -> Result<Vec<(&'a StateModule, &'a StateReturnConfig)>, EngineError> {
    let mut plan: Vec<(&StateModule, &StateReturnConfig)> = Vec::with_capacity(requests.len());
    for config in requests {
        let module = registry.lookup(&config.state_code)?;
        let code = module.code();
        if plan.iter().any(|(m, _)| m.code() == code) {
            return Err(EngineError::DuplicateStateReturn { code });
        }
        validate_residency_window(&config.residency)
            .map_err(|source| EngineError::InvalidResidency {
                state: code,
                source,
            })?;
        plan.push((module, config));
    }
    Ok(plan)
}

/// One result per entry in `taxpayer.state_returns`, in the same order.
///
/// # Errors
/// Configuration errors only: an unsupported or repeated state code, or a
/// residency date that is present but unparsable.  Module computation itself
/// is total.
pub fn compute_state_returns(
    registry: &ModuleRegistry,
    taxpayer: &TaxpayerModel,
    federal: &FederalResult,
) -> Result<Vec<StateComputeResult>, EngineError> {
    let plan = resolve(registry, &taxpayer.state_returns)?;

    let results = plan
        .into_iter()
        .map(|(module, config)| {
            let span = debug_span!("state", code = module.code().as_str());
            let _guard = span.enter();
            let result = module.compute(taxpayer, federal, config);
            debug!(
                state = result.state_code.as_str(),
                residency = result.residency_type.as_str(),
                ratio = %result.apportionment_ratio,
                tax_after_credits = result.tax_after_credits.raw(),
                "state computed"
            );
            result
        })
        .collect();
    Ok(results)
}

/// Combined provenance for a return: the federal graph, then each state's
/// graph in the order of `states`.
///
/// Every state graph references `f1040.*` ids, so the federal graph is
/// always absorbed first.
pub fn collect_state_provenance(
    registry: &ModuleRegistry,
    federal: &FederalResult,
    states: &[StateComputeResult],
) -> Result<ProvenanceGraph, EngineError> {
    let mut combined = ProvenanceGraph::combined();
    let federal_graph = ttx_federal::collect_traced_values(federal)
        .map_err(|source| EngineError::FederalProvenance { source })?;
    combined
        .absorb(&federal_graph)
        .map_err(|source| EngineError::FederalProvenance { source })?;

    for result in states {
        let state = result.state_code;
        let module = registry
            .get(state)
            .ok_or_else(|| EngineError::UnsupportedJurisdiction {
                code: state.as_str().to_string(),
            })?;
        let graph = module
            .collect_traced_values(result)
            .map_err(|source| EngineError::Collect { state, source })?;
        combined
            .absorb(&graph)
            .map_err(|source| EngineError::Provenance { state, source })?;
    }
    Ok(combined)
}

/// Federal return, every requested state return, and the combined
/// provenance graph, stamped with a fresh run id.
pub fn compute_return(
    registry: &ModuleRegistry,
    federal_tables: &FederalTables,
    taxpayer: &TaxpayerModel,
) -> Result<ReturnComputation, EngineError> {
    if taxpayer.tax_year != registry.tax_year() {
        return Err(EngineError::TaxYearMismatch {
            requested: taxpayer.tax_year,
            tables: registry.tax_year(),
        });
    }
    // Surface configuration errors before doing any work.
    resolve(registry, &taxpayer.state_returns)?;

    let federal = ttx_federal::compute_federal(taxpayer, federal_tables);
    let states = compute_state_returns(registry, taxpayer, &federal)?;
    let provenance = collect_state_provenance(registry, &federal, &states)?;

    let run_id = Uuid::new_v4();
    info!(
        run_id = %run_id,
        tax_year = taxpayer.tax_year,
        states = states.len(),
        nodes = provenance.len(),
        "return computed"
    );

    Ok(ReturnComputation {
        run_id,
        federal,
        states,
        provenance,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ttx_config::TaxTables;
    use ttx_money::{Cents, ResidencyWindow};
    use ttx_schemas::{DeductionElection, FilingStatus, IncomeDocuments, Person, W2};

    fn taxpayer(states: &[(&str, ResidencyWindow)]) -> TaxpayerModel {
        TaxpayerModel {
            tax_year: 2025,
            filing_status: FilingStatus::Single,
            taxpayer: Person::new("Lee", "Park"),
            spouse: None,
            dependents: Vec::new(),
            income: IncomeDocuments {
                w2s: vec![W2 {
                    employer: "Acme".to_string(),
                    wages: Cents::new(6_000_000),
                    federal_withholding: Cents::new(600_000),
                    state_lines: Vec::new(),
                }],
                ..IncomeDocuments::default()
            },
            deduction: DeductionElection::Standard,
            prior_year_state: None,
            state_returns: states
                .iter()
                .map(|(c, w)| StateReturnConfig::new(*c, w.clone()))
                .collect(),
        }
    }

    fn setup() -> (TaxTables, ModuleRegistry) {
        let tables = TaxTables::builtin().unwrap();
        let reg = ModuleRegistry::builtin(&tables).unwrap();
        (tables, reg)
    }

    #[test]
    fn no_requested_states_yields_federal_only() {
        let (tables, reg) = setup();
        let run = compute_return(&reg, &tables.federal, &taxpayer(&[])).unwrap();
        assert!(run.states.is_empty());
        assert!(run.provenance.iter().all(|n| n.id.namespace().as_str() == "f1040"));
    }

    #[test]
    fn repeated_state_is_a_configuration_error() {
        let (tables, reg) = setup();
        let tp = taxpayer(&[
            ("GA", ResidencyWindow::full_year()),
            ("ga", ResidencyWindow::nonresident()),
        ]);
        let err = compute_return(&reg, &tables.federal, &tp).unwrap_err();
        assert!(matches!(err, EngineError::DuplicateStateReturn { code: StateCode::Ga }));
        assert!(err.is_configuration());
    }

    #[test]
    fn tax_year_must_match_tables() {
        let (tables, reg) = setup();
        let mut tp = taxpayer(&[("GA", ResidencyWindow::full_year())]);
        tp.tax_year = 2024;
        let err = compute_return(&reg, &tables.federal, &tp).unwrap_err();
        assert!(matches!(
            err,
            EngineError::TaxYearMismatch {
                requested: 2024,
                tables: 2025
            }
        ));
    }

    #[test]
    fn state_lookup_uses_result_code() {
        let (tables, reg) = setup();
        let tp = taxpayer(&[("MO", ResidencyWindow::full_year())]);
        let run = compute_return(&reg, &tables.federal, &tp).unwrap();

        let only_ga = ModuleRegistry::with_states(&tables, &[StateCode::Ga]).unwrap();
        let err = collect_state_provenance(&only_ga, &run.federal, &run.states).unwrap_err();
        assert!(matches!(err, EngineError::UnsupportedJurisdiction { ref code } if code == "MO"));
    }

    #[test]
    fn provenance_view_keeps_complete_graph() {
        let (tables, reg) = setup();
        let tp = taxpayer(&[("LA", ResidencyWindow::full_year())]);
        let run = compute_return(&reg, &tables.federal, &tp).unwrap();

        let all = run.provenance_view(ElisionPolicy::ShowAll);
        let elided = run.provenance_view(ElisionPolicy::ElideZero);
        assert_eq!(all.len(), run.provenance.len());
        assert!(elided.len() < all.len());
        elided.topological_order().unwrap();
        assert_eq!(run.state(StateCode::La).map(|s| s.form_label), Some("IT-540"));
    }
}
