//! Built-in bank of physician questions used to seed fresh installs.

use crate::model::{Category, Difficulty, Question, QuestionId};

struct Entry {
    id: &'static str,
    category: Category,
    difficulty: Difficulty,
    text: &'static str,
    context: &'static str,
}

const ENTRIES: [Entry; 20] = [
    Entry {
        id: "q1",
        category: Category::CostAndValue,
        difficulty: Difficulty::Hard,
        text: "Why is this therapy so expensive compared to existing treatments?",
        context: "Physician is concerned about insurance coverage and patient affordability",
    },
    Entry {
        id: "q2",
        category: Category::CostAndValue,
        difficulty: Difficulty::Hard,
        text: "How do you justify the price when generic alternatives exist?",
        context: "Physician is comparing to older, cheaper medications",
    },
    Entry {
        id: "q3",
        category: Category::CostAndValue,
        difficulty: Difficulty::Medium,
        text: "My patients can't afford this. What can you do about it?",
        context: "Physician serves underserved population with limited resources",
    },
    Entry {
        id: "q4",
        category: Category::ClinicalDataAndEvidence,
        difficulty: Difficulty::Hard,
        text: "Your trial excluded elderly patients. How do I know this works for my population?",
        context: "Physician treats primarily elderly patients not represented in trials",
    },
    Entry {
        id: "q5",
        category: Category::ClinicalDataAndEvidence,
        difficulty: Difficulty::Medium,
        text: "The study was only 12 weeks. What about long-term safety?",
        context: "Physician concerned about chronic use safety",
    },
    Entry {
        id: "q6",
        category: Category::ClinicalDataAndEvidence,
        difficulty: Difficulty::Hard,
        text: "Your competitor's trial had better results. Why should I use yours?",
        context: "Physician comparing head-to-head with competitor",
    },
    Entry {
        id: "q7",
        category: Category::ClinicalDataAndEvidence,
        difficulty: Difficulty::Medium,
        text: "I need to see the actual data, not just your marketing materials.",
        context: "Physician wants primary literature and detailed analysis",
    },
    Entry {
        id: "q8",
        category: Category::PatientAcceptance,
        difficulty: Difficulty::Medium,
        text: "My patients won't comply with this complex regimen.",
        context: "Physician concerned about adherence with complicated dosing",
    },
    Entry {
        id: "q9",
        category: Category::PatientAcceptance,
        difficulty: Difficulty::Medium,
        text: "The side effects will scare my patients away.",
        context: "Physician worried about patient tolerance and discontinuation",
    },
    Entry {
        id: "q10",
        category: Category::PatientAcceptance,
        difficulty: Difficulty::Hard,
        text: "This requires too much monitoring. I don't have the resources.",
        context: "Physician in resource-limited practice setting",
    },
    Entry {
        id: "q11",
        category: Category::PatientAcceptance,
        difficulty: Difficulty::Easy,
        text: "Patients complain about injection site reactions. What can I tell them?",
        context: "Physician dealing with common tolerability issue",
    },
    Entry {
        id: "q12",
        category: Category::ClinicalDecisionMaking,
        difficulty: Difficulty::Hard,
        text: "I don't have time for this! The treatment decision is complex enough already.",
        context: "Busy physician with limited time for new information",
    },
    Entry {
        id: "q13",
        category: Category::ClinicalDecisionMaking,
        difficulty: Difficulty::Medium,
        text: "I need a simple algorithm. When exactly should I use this?",
        context: "Physician wants clear treatment positioning",
    },
    Entry {
        id: "q14",
        category: Category::ClinicalDecisionMaking,
        difficulty: Difficulty::Medium,
        text: "How is this different from what I'm already using?",
        context: "Physician needs quick differentiation",
    },
    Entry {
        id: "q15",
        category: Category::DataValidity,
        difficulty: Difficulty::Hard,
        text: "Your study design has serious flaws. How can I trust these results?",
        context: "Physician with methodological concerns about trial design",
    },
    Entry {
        id: "q16",
        category: Category::DataValidity,
        difficulty: Difficulty::Hard,
        text: "The placebo response rate seems suspiciously low.",
        context: "Physician questioning data validity",
    },
    Entry {
        id: "q17",
        category: Category::TreatmentPracticality,
        difficulty: Difficulty::Medium,
        text: "My infusion center can't handle another complex protocol.",
        context: "Physician concerned about operational feasibility",
    },
    Entry {
        id: "q18",
        category: Category::TreatmentPracticality,
        difficulty: Difficulty::Medium,
        text: "What if my patient has a reaction during infusion?",
        context: "Physician concerned about safety management",
    },
    Entry {
        id: "q19",
        category: Category::TreatmentPracticality,
        difficulty: Difficulty::Hard,
        text: "Insurance won't cover this without prior authorization. That takes weeks!",
        context: "Physician frustrated with access barriers",
    },
    Entry {
        id: "q20",
        category: Category::SkepticismAndPushback,
        difficulty: Difficulty::Hard,
        text: "I've heard this all before from drug reps. Why should I believe you?",
        context: "Physician skeptical of pharmaceutical industry claims",
    },
];

/// The reference question bank, in id order.
#[must_use]
pub fn builtin_questions() -> Vec<Question> {
    ENTRIES
        .into_iter()
        .filter_map(|entry| {
            Question::new(
                QuestionId::new(entry.id),
                entry.category,
                entry.text,
                entry.difficulty,
            )
            .ok()
            .map(|q| q.with_context(entry.context))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn catalog_covers_every_known_category() {
        let questions = builtin_questions();
        assert_eq!(questions.len(), 20);

        let categories: HashSet<_> = questions.iter().map(|q| q.category().clone()).collect();
        for category in Category::KNOWN {
            assert!(categories.contains(&category), "missing {category}");
        }
    }

    #[test]
    fn catalog_ids_are_unique() {
        let questions = builtin_questions();
        let ids: HashSet<_> = questions.iter().map(|q| q.id().clone()).collect();
        assert_eq!(ids.len(), questions.len());
    }
}
