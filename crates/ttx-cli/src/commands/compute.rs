//! `ttx compute` and `ttx explain`.

use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::json;
use ttx_config::UnusedKeyPolicy;
use ttx_engine::{compute_return, ReturnComputation};
use ttx_money::Cents;
use ttx_provenance::{write_trail, ElisionPolicy, ProvenanceGraph};
use ttx_schemas::FederalResult;
use ttx_states::{ResultKind, ResultLine, ReviewRow, StateComputeResult, StateRulesModule};

use super::{load_return, load_session, node_label, Session};

pub struct ComputeArgs {
    pub return_path: String,
    pub tables: Vec<String>,
    pub show_zero: bool,
    pub trail: Option<String>,
    pub json: bool,
}

/// One state as printed: the uniform result plus its review rows.
#[derive(Serialize)]
struct StateReport<'a> {
    #[serde(flatten)]
    result: &'a StateComputeResult,
    review: Vec<ReviewRow>,
    result_line: Option<&'static ResultLine>,
}

fn run(session: &Session, return_path: &str) -> Result<ReturnComputation> {
    let taxpayer = load_return(return_path)?;
    compute_return(&session.registry, &session.tables.federal, &taxpayer)
        .with_context(|| format!("compute failed for {}", return_path))
}

fn state_reports<'a>(
    session: &Session,
    run: &'a ReturnComputation,
    view: &ProvenanceGraph,
) -> Vec<StateReport<'a>> {
    run.states
        .iter()
        .map(|result| {
            let meta = session.registry.get(result.state_code).map(|m| m.meta());
            StateReport {
                result,
                review: meta
                    .map(|m| m.review_rows(result, view))
                    .unwrap_or_default(),
                result_line: meta.and_then(|m| m.result_line(result)),
            }
        })
        .collect()
}

pub fn compute(args: ComputeArgs) -> Result<()> {
    let session = load_session(&args.tables, UnusedKeyPolicy::Warn)?;
    let run = run(&session, &args.return_path)?;

    let policy = if args.show_zero {
        ElisionPolicy::ShowAll
    } else {
        ElisionPolicy::ElideZero
    };
    let view = run.provenance_view(policy);
    let reports = state_reports(&session, &run, &view);

    let trail = match &args.trail {
        Some(path) => Some((path, write_trail(path, run.run_id, &run.provenance)?.len())),
        None => None,
    };

    if args.json {
        let doc = json!({
            "run_id": run.run_id,
            "tables_hash": session.loaded.config_hash,
            "federal": run.federal,
            "states": reports,
            "provenance": view.to_json(),
            "provenance_digest": run.provenance.digest(),
        });
        let out = serde_json::to_string_pretty(&doc).context("serialize compute output failed")?;
        println!("{out}");
        return Ok(());
    }

    println!("run_id={}", run.run_id);
    println!("tables_hash={}", session.loaded.config_hash);
    print_federal(&run.federal);
    for report in &reports {
        print_state(report);
    }
    println!(
        "provenance_nodes={} shown={} digest={}",
        run.provenance.len(),
        view.len(),
        run.provenance.digest()
    );
    if let Some((path, records)) = trail {
        println!("trail_written=true path={} records={}", path, records);
    }
    Ok(())
}

fn print_federal(f: &FederalResult) {
    println!(
        "federal status={} agi={} deduction={} taxable_income={} total_tax={} payments={} refund={} amount_owed={}",
        f.filing_status.as_str(),
        f.agi,
        f.deduction,
        f.taxable_income,
        f.total_tax,
        f.total_payments,
        f.refund,
        f.amount_owed
    );
}

fn print_state(report: &StateReport<'_>) {
    let r = report.result;
    println!(
        "state={} form=\"{}\" residency={} ratio={} agi={} taxable={} tax={} credits={} tax_after_credits={} withholding={} overpaid={} owed={}",
        r.state_code,
        r.form_label,
        r.residency_type,
        r.apportionment_ratio,
        r.state_agi,
        r.state_taxable_income,
        r.state_tax_before_credits,
        r.total_credits,
        r.tax_after_credits,
        r.state_withholding,
        r.overpaid,
        r.owed
    );
    for row in &report.review {
        println!("  {} | {} = {}", row.section, row.label, row.amount);
    }
    if let Some(line) = report.result_line {
        let amount = match line.kind {
            ResultKind::Refund => r.overpaid,
            ResultKind::Owed => r.owed,
            ResultKind::ZeroBalance => Cents::ZERO,
        };
        println!("  => {} = {}", line.label, amount);
    }
}

pub fn explain(return_path: &str, node: &str, tables: &[String]) -> Result<()> {
    let session = load_session(tables, UnusedKeyPolicy::Warn)?;
    let run = run(&session, return_path)?;

    let lineage = run
        .provenance
        .lineage_of(node)
        .with_context(|| format!("cannot explain '{}'", node))?;

    println!("run_id={}", run.run_id);
    for n in lineage {
        let label = node_label(&session.registry, &n.id).unwrap_or("");
        println!("{} = {}  [{}] {}", n.id, n.amount, label, n.description);
        if !n.derived_from.is_empty() {
            let deps: Vec<String> = n.derived_from.iter().map(|d| d.to_string()).collect();
            println!("    <- {}", deps.join(", "));
        }
    }
    Ok(())
}
