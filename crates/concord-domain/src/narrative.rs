//! Narrative fallback
//!
//! Rule-based text used when the Classifier Service returns a verdict without
//! reasoning or recommendations. Every rule reads only the couple's own
//! features, so the same couple always receives the same text.

use crate::assembler::AGREE_THRESHOLD;
use crate::profile::{CivilStatus, Demographics};
use crate::relational::{ratio_at_least, RelationalFeatures};
use crate::verdict::{FocusCategory, RiskLevel};

fn pct(v: f64) -> i64 {
    (v * 100.0) as i64
}

/// Explain a risk level from demographics and relational features
///
/// # Examples
///
/// ```
/// use concord_domain::narrative::risk_reasoning;
/// use concord_domain::{Demographics, FeatureLayout, RelationalFeatures, RespondentProfile, RiskLevel};
///
/// let d = Demographics::from_profiles(&RespondentProfile::default(), &RespondentProfile::default());
/// let r = RelationalFeatures::compute(&[4, 4], &[4, 4], &[4, 4, 4, 4], &FeatureLayout::default());
/// let text = risk_reasoning(&d, &r, RiskLevel::Low);
/// assert!(text.starts_with("Low risk assessment based on: "));
/// assert!(text.contains("High alignment (100%)"));
/// ```
pub fn risk_reasoning(
    demographics: &Demographics,
    relational: &RelationalFeatures,
    risk_level: RiskLevel,
) -> String {
    let mut parts = Vec::new();

    let gap = demographics.age_gap();
    let gap_band = match gap {
        g if g > 10 => "Significant",
        g if g > 5 => "Moderate",
        _ => "Minimal",
    };
    parts.push(format!("{} age gap ({} years) between partners", gap_band, gap));

    match demographics.civil_status {
        CivilStatus::LivingIn => {
            let years = demographics.years_living_together;
            if years > 5 {
                parts.push(format!(
                    "Long-term cohabitation ({} years) with established patterns",
                    years
                ));
            } else if years > 0 {
                parts.push(format!(
                    "Recent cohabitation ({} years) with developing patterns",
                    years
                ));
            }
        }
        status if status.is_previous_relationship() => {
            parts.push(format!(
                "Previous relationship experience ({}) affecting current dynamics",
                status
            ));
        }
        _ => {}
    }

    if demographics.past_children && demographics.children > 0 {
        let noun = if demographics.children > 1 {
            "children"
        } else {
            "child"
        };
        parts.push(format!(
            "Parenting experience with {} {}",
            demographics.children, noun
        ));
    }

    let alignment = relational.alignment_score;
    if alignment > 0.7 {
        parts.push(format!("High alignment ({}%) in questionnaire responses", pct(alignment)));
    } else if alignment < 0.4 {
        parts.push(format!(
            "Low alignment ({}%) indicating significant disagreements",
            pct(alignment)
        ));
    } else {
        parts.push(format!(
            "Moderate alignment ({}%) with some areas of agreement",
            pct(alignment)
        ));
    }

    let conflict = relational.conflict_ratio;
    if conflict > 0.3 {
        parts.push(format!("High conflict patterns ({}% disagreement rate)", pct(conflict)));
    } else if conflict < 0.1 {
        parts.push(format!("Low conflict patterns ({}% disagreement rate)", pct(conflict)));
    }

    if demographics.education_income_gap() > 2 {
        parts.push("Significant education-income mismatch affecting compatibility".to_string());
    } else {
        parts.push("Compatible education and income levels".to_string());
    }

    let keep = match risk_level {
        RiskLevel::High => 4,
        RiskLevel::Medium | RiskLevel::Low => 3,
    };
    parts.truncate(keep);

    format!("{} risk assessment based on: {}", risk_level, parts.join("; "))
}

/// Explain the counseling focus from category priorities and confidence
pub fn counseling_reasoning(focus: &[FocusCategory], confidence: f64) -> String {
    let mut parts = Vec::new();

    let critical = names_where(focus, |s| s > 0.6);
    if !critical.is_empty() {
        parts.push(format!("Critical needs in: {}", critical.join(", ")));
    }
    let developing = names_where(focus, |s| s > 0.3 && s <= 0.6);
    if !developing.is_empty() {
        parts.push(format!("Development areas in: {}", developing.join(", ")));
    }
    let strong = names_where(focus, |s| s <= 0.3);
    if !strong.is_empty() {
        parts.push(format!("Strong areas in: {}", strong.join(", ")));
    }

    let band = if confidence > 0.6 {
        "High"
    } else if confidence > 0.3 {
        "Moderate"
    } else {
        "Conservative"
    };
    parts.push(format!(
        "{} confidence ({}%) in assessment accuracy",
        band,
        pct(confidence)
    ));

    parts.truncate(3);
    format!("Counseling recommendation based on: {}", parts.join("; "))
}

/// First two category names whose score satisfies `pred`
fn names_where(focus: &[FocusCategory], pred: impl Fn(f64) -> bool) -> Vec<&str> {
    focus
        .iter()
        .filter(|c| pred(c.score))
        .take(2)
        .map(|c| c.name.as_str())
        .collect()
}

/// Derive recommendations from the couple's features alone
pub fn rule_based_recommendations(
    risk_level: RiskLevel,
    focus: &[FocusCategory],
    relational: &RelationalFeatures,
    male_responses: &[i64],
    female_responses: &[i64],
) -> Vec<String> {
    let mut out = Vec::new();
    let r = relational;

    let alignment = r.alignment_score;
    out.push(if alignment < 0.3 {
        format!(
            "Critical alignment: only {}% agreement - immediate relationship counseling required",
            pct(alignment)
        )
    } else if alignment < 0.5 {
        format!(
            "Significant disagreement: {}% disagreement on key issues - structured communication therapy needed",
            pct(1.0 - alignment)
        )
    } else if alignment < 0.7 {
        format!(
            "Moderate alignment: {}% agreement - focus on understanding different perspectives",
            pct(alignment)
        )
    } else {
        format!(
            "Strong alignment: {}% agreement - continue building on shared values and goals",
            pct(alignment)
        )
    });

    let male_positive = ratio_at_least(male_responses, AGREE_THRESHOLD);
    let female_positive = ratio_at_least(female_responses, AGREE_THRESHOLD);
    let optimism = (male_positive + female_positive) / 2.0;
    out.push(if optimism > 0.7 {
        format!("Excellent harmony: {}% positive responses - maintain current communication patterns", pct(optimism))
    } else if optimism > 0.5 {
        format!("Good harmony: {}% positive responses - good foundation with room for growth", pct(optimism))
    } else if optimism > 0.3 {
        format!("Moderate harmony: {}% positive responses - build shared positive perspectives", pct(optimism))
    } else {
        format!("Concerning harmony: only {}% positive responses - intensive counseling needed", pct(optimism))
    });

    let conflict = r.conflict_ratio;
    out.push(if conflict > 0.5 {
        format!("High conflict: {}% of responses show major disagreement - intensive conflict resolution counseling required", pct(conflict))
    } else if conflict > 0.3 {
        format!("Moderate conflict: {}% disagreement - mediation and communication skills training recommended", pct(conflict))
    } else if conflict > 0.1 {
        format!("Minor conflicts: {}% disagreement - focus on conflict prevention strategies", pct(conflict))
    } else {
        format!("Low conflict: {}% disagreement - maintain current communication patterns", pct(conflict))
    });

    let balance = r.power_balance;
    if (balance > 1.5 || balance < 0.3) && alignment < 0.8 {
        let (lead, lead_avg, other, other_avg) = if r.male_avg_response > r.female_avg_response {
            ("Male", r.male_avg_response, "female", r.female_avg_response)
        } else {
            ("Female", r.female_avg_response, "male", r.male_avg_response)
        };
        out.push(format!(
            "{} dominance: {:.1} vs {} {:.1} average - ensure balanced decision-making",
            lead, lead_avg, other, other_avg
        ));
    } else if (0.7..=1.3).contains(&balance) {
        out.push(format!(
            "Balanced partnership: {:.1} power balance - good relationship equality",
            balance
        ));
    }

    for (who, consistency) in [("Male", r.male_consistency), ("Female", r.female_consistency)] {
        out.push(if consistency < 0.3 {
            format!("{} inconsistency: {}% consistency - individual counseling to clarify values and goals", who, pct(consistency))
        } else if consistency < 0.6 {
            format!("{} uncertainty: {}% consistency - values clarification sessions may help", who, pct(consistency))
        } else {
            format!("{} clarity: {}% consistency - clear values and goals", who, pct(consistency))
        });
    }

    for (who, positive) in [("Male", male_positive), ("Female", female_positive)] {
        if positive > 0.7 {
            out.push(format!("{} positive: {}% positive responses - good engagement", who, pct(positive)));
        } else if positive < 0.3 {
            out.push(format!("{} concerns: only {}% positive responses - individual counseling recommended", who, pct(positive)));
        }
    }

    match risk_level {
        RiskLevel::High => {
            out.push("High risk profile: intensive counseling on communication and conflict resolution".to_string());
            if conflict > 0.4 {
                out.push(format!(
                    "Crisis intervention: {}% conflict rate - immediate mediation required",
                    pct(conflict)
                ));
            }
        }
        RiskLevel::Medium => out.push(
            "Medium risk profile: proactive counseling before issues escalate".to_string(),
        ),
        RiskLevel::Low => out.push(
            "Low risk profile: preventive counseling to maintain healthy patterns".to_string(),
        ),
    }

    for category in focus {
        if let Some(line) = focus_recommendation(category) {
            out.push(line);
        }
    }

    let variance = r.response_variance;
    out.push(if variance > 2.5 {
        format!("Complex dynamics: high variance ({:.1}) - comprehensive assessment recommended", variance)
    } else if variance > 1.5 {
        format!("Varied responses: moderate variance ({:.1}) - structured communication training recommended", variance)
    } else if variance > 0.5 {
        format!("Balanced diversity: healthy variance ({:.1}) - continue current approach", variance)
    } else {
        format!("Consistent patterns: low variance ({:.1}) - stable relationship dynamics", variance)
    });

    out
}

fn focus_recommendation(category: &FocusCategory) -> Option<String> {
    let name = category.name.as_str();
    let theme = if name.contains("Marriage") {
        "relationship foundation"
    } else if name.contains("Family") {
        "family planning"
    } else if name.contains("Health") {
        "health and wellness"
    } else {
        return None;
    };

    let band = if category.score > 0.7 {
        "Critical"
    } else if category.score > 0.5 {
        "High"
    } else if category.score > 0.3 {
        "Moderate"
    } else {
        return None;
    };

    Some(format!(
        "{} focus on {}: {} at {}% - {} counseling",
        band,
        theme,
        name,
        pct(category.score),
        theme
    ))
}
