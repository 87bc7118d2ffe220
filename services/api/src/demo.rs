use std::sync::Arc;

use chrono::{DateTime, Local, NaiveDate, TimeZone, Utc};
use clap::Args;

use crate::infra::{InMemoryEvaluationRepository, InMemoryTenderRepository};
use tender_eval::error::AppError;
use tender_eval::workflows::tender::domain::{
    ApprovalId, ApprovalRecord, ApprovalStatus, Tender, TenderCategory, TenderId,
};
use tender_eval::workflows::tender::evaluation::{
    BidderId, ConflictDetail, ConflictKind, EvaluationPeriod, EvaluationSettings, EvaluatorId,
    EvaluatorRole, EvaluatorSeat, NewAssignment, NewDeclaration, OverrideRequest, ReviewDecision,
    RiskLevel, ScoreEntry, ScoreSubmission, TenderEvaluationService,
};
use tender_eval::workflows::tender::template::{
    CriterionCategory, CriterionId, EvaluationTemplate, ScoringCriterion,
};

#[derive(Args, Debug)]
pub(crate) struct DemoArgs {
    /// Evaluation date for the status checks (defaults to today)
    #[arg(long, value_parser = parse_date)]
    today: Option<NaiveDate>,
    /// Print every scorecard after the round completes
    #[arg(long)]
    list_scorecards: bool,
}

fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}

fn at(date: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_hms_opt(10, 0, 0).expect("valid time"))
}

type DemoService = TenderEvaluationService<InMemoryTenderRepository, InMemoryEvaluationRepository>;

fn demo_template() -> EvaluationTemplate {
    let criterion = |id: &str, name: &str, category, weight| ScoringCriterion {
        id: CriterionId(id.to_string()),
        name: name.to_string(),
        category,
        max_score: weight,
    };
    EvaluationTemplate::new(
        "QCBS 70/30 demo",
        vec![
            criterion(
                "technical-capability",
                "Technical Capability",
                CriterionCategory::Technical,
                22,
            ),
            criterion(
                "key-staff",
                "Key Staff Experience",
                CriterionCategory::Technical,
                18,
            ),
            criterion("methodology", "Methodology", CriterionCategory::Technical, 15),
            criterion("work-plan", "Work Plan", CriterionCategory::Technical, 10),
            criterion(
                "financial-offer",
                "Financial Offer",
                CriterionCategory::Financial,
                30,
            ),
        ],
    )
}

fn submission(evaluator: &str, bidder: &str, values: [f64; 5]) -> ScoreSubmission {
    let ids = [
        "technical-capability",
        "key-staff",
        "methodology",
        "work-plan",
        "financial-offer",
    ];
    ScoreSubmission {
        tender_id: TenderId("tender-demo".to_string()),
        evaluator_id: EvaluatorId(evaluator.to_string()),
        bidder_id: BidderId(bidder.to_string()),
        scores: ids
            .iter()
            .zip(values)
            .map(|(id, score)| ScoreEntry {
                criterion_id: CriterionId(id.to_string()),
                score,
                comment: None,
            })
            .collect(),
    }
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let today = args.today.unwrap_or_else(|| Local::now().date_naive());

    let tenders = Arc::new(InMemoryTenderRepository::default());
    let evaluations = Arc::new(InMemoryEvaluationRepository::default());
    let service: DemoService = TenderEvaluationService::new(
        tenders.clone(),
        evaluations,
        EvaluationSettings::default(),
    );

    let tender_id = TenderId("tender-demo".to_string());
    let closing = today - chrono::Duration::days(5);
    let mut tender = Tender::draft(
        tender_id.clone(),
        "Feeder roads rehabilitation, design review and supervision".to_string(),
        TenderCategory::Consultancy,
        closing,
    );
    tender.status = tender_eval::workflows::tender::domain::TenderStatus::Open;
    service.register_tender(tender)?;

    println!("Tender evaluation demo");
    println!("Tender closed on {closing}; scoring runs under a 70/30 QCBS split.\n");

    let assignment = service.create_assignment(NewAssignment {
        tender_id: tender_id.clone(),
        template: demo_template(),
        roster: vec![
            EvaluatorSeat {
                evaluator_id: EvaluatorId("eval-chair".to_string()),
                name: "Amina Yusuf".to_string(),
                role: EvaluatorRole::Chairman,
            },
            EvaluatorSeat {
                evaluator_id: EvaluatorId("eval-m1".to_string()),
                name: "Daniel Okello".to_string(),
                role: EvaluatorRole::Member,
            },
            EvaluatorSeat {
                evaluator_id: EvaluatorId("eval-m2".to_string()),
                name: "Grace Mutai".to_string(),
                role: EvaluatorRole::Member,
            },
        ],
        bidders: vec![
            BidderId("alpha-engineering".to_string()),
            BidderId("beta-consult".to_string()),
        ],
        period: EvaluationPeriod {
            start: today,
            end: today + chrono::Duration::days(14),
        },
    })?;

    println!("Normalized criteria (technical sums to 70, financial to 30):");
    for criterion in &assignment.template.criteria {
        println!(
            "- {} [{}]: {} points",
            criterion.name,
            criterion.category.label(),
            criterion.max_score
        );
    }

    // Grace consulted for Alpha Engineering last year; the ethics review
    // recuses her from that bidder only.
    let declaration = service.declare_conflict(
        NewDeclaration {
            tender_id: tender_id.clone(),
            evaluator_id: EvaluatorId("eval-m2".to_string()),
            has_conflict: true,
            details: vec![ConflictDetail {
                kind: ConflictKind::Professional,
                bidder_id: BidderId("alpha-engineering".to_string()),
                relationship: "Engaged as a consultant in 2025".to_string(),
            }],
        },
        at(today),
    )?;
    service.review_conflict(
        &declaration.id,
        ReviewDecision::Approve {
            risk: RiskLevel::Medium,
            mitigation: vec!["Recusal from the named bidder".to_string()],
        },
        "ethics-officer".to_string(),
        None,
        at(today),
    )?;
    println!("\nCOI review: Grace Mutai recused from alpha-engineering.");

    let rounds = [
        ("eval-chair", "alpha-engineering", [22.0, 17.0, 14.0, 10.0, 26.0]),
        ("eval-chair", "beta-consult", [18.0, 14.0, 11.0, 8.0, 28.0]),
        ("eval-m1", "alpha-engineering", [21.0, 16.0, 13.0, 9.0, 27.0]),
        ("eval-m1", "beta-consult", [17.0, 15.0, 12.0, 8.0, 29.0]),
        ("eval-m2", "alpha-engineering", [24.0, 19.0, 16.0, 11.0, 30.0]),
        ("eval-m2", "beta-consult", [16.0, 13.0, 12.0, 7.0, 27.0]),
    ];
    for (evaluator, bidder, values) in rounds {
        let view = service.submit_scores(submission(evaluator, bidder, values), at(today))?;
        println!(
            "Scorecard submitted: {} on {} -> {} points",
            evaluator, bidder, view.total_score
        );
    }

    // The chairman trims an unsupported methodology score.
    service.chairman_override(
        OverrideRequest {
            tender_id: tender_id.clone(),
            actor: EvaluatorId("eval-chair".to_string()),
            evaluator_id: EvaluatorId("eval-m1".to_string()),
            bidder_id: BidderId("beta-consult".to_string()),
            criterion_id: CriterionId("methodology".to_string()),
            new_score: 10.0,
            reason: "Methodology score not supported by the written proposal".to_string(),
        },
        at(today),
    )?;

    let result = service.consensus(&tender_id)?;
    println!("\nFinal ranking (evaluation {}complete):", if result.complete { "" } else { "in" });
    for standing in &result.standings {
        println!(
            "{}. {} with {:.2} points",
            standing.rank, standing.bidder_id, standing.total_score
        );
    }

    println!("\nOverride log:");
    for entry in &result.overrides {
        println!(
            "- {} on {} for {}: {} -> {} ({})",
            entry.criterion_id,
            entry.evaluator_id,
            entry.bidder_id,
            entry.old_score,
            entry.new_score,
            entry.reason
        );
    }

    let view = service.resolve_status(&tender_id, at(today))?;
    println!("\nStatus after evaluation: {} (stage {})", view.status_label, view.stage_label);

    tenders.record_approval(ApprovalRecord {
        id: ApprovalId("noa-demo".to_string()),
        tender_id: tender_id.clone(),
        status: ApprovalStatus::Pending,
        decided_on: None,
        remarks: None,
    });
    let view = service.resolve_status(&tender_id, at(today))?;
    println!(
        "Status after the no-objection request: {} (stage {})",
        view.status_label, view.stage_label
    );

    if args.list_scorecards {
        println!("\nScorecards:");
        let result = service.consensus(&tender_id)?;
        for standing in &result.standings {
            println!("{}:", standing.bidder_id);
            for average in &standing.criterion_averages {
                println!(
                    "  {}: {:.2} / {}",
                    average.criterion_name, average.average, average.max_score
                );
            }
        }
    }

    Ok(())
}
