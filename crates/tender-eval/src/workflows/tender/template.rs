use serde::{Deserialize, Serialize};

/// Identifier wrapper for scoring criteria.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CriterionId(pub String);

impl std::fmt::Display for CriterionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CriterionCategory {
    Technical,
    Financial,
}

impl CriterionCategory {
    pub const fn ordered() -> [Self; 2] {
        [Self::Technical, Self::Financial]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Technical => "Technical",
            Self::Financial => "Financial",
        }
    }
}

/// One weighted criterion. Before normalization `max_score` holds the raw
/// weight supplied by the template author; afterwards it is the number of
/// points the criterion contributes to the category target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoringCriterion {
    pub id: CriterionId,
    pub name: String,
    pub category: CriterionCategory,
    pub max_score: u16,
}

/// Category point targets for a QCBS template, e.g. 70 technical / 30 financial.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreTargets {
    pub technical: u16,
    pub financial: u16,
}

impl Default for ScoreTargets {
    fn default() -> Self {
        Self {
            technical: 70,
            financial: 30,
        }
    }
}

impl ScoreTargets {
    const fn for_category(&self, category: CriterionCategory) -> u16 {
        match category {
            CriterionCategory::Technical => self.technical,
            CriterionCategory::Financial => self.financial,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TemplateError {
    #[error("no {} criteria to carry the {target} point target", category.label())]
    EmptyCategory {
        category: CriterionCategory,
        target: u16,
    },
    #[error("{} criteria weights sum to zero, target {target} is unreachable", category.label())]
    ZeroWeights {
        category: CriterionCategory,
        target: u16,
    },
    #[error("{} residual pushed criterion {criterion:?} below zero", category.label())]
    TargetUnreachable {
        category: CriterionCategory,
        criterion: CriterionId,
    },
}

/// Ordered list of weighted criteria for one tender evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationTemplate {
    pub name: String,
    pub criteria: Vec<ScoringCriterion>,
}

impl EvaluationTemplate {
    pub fn new(name: impl Into<String>, criteria: Vec<ScoringCriterion>) -> Self {
        Self {
            name: name.into(),
            criteria,
        }
    }

    pub fn criterion(&self, id: &CriterionId) -> Option<&ScoringCriterion> {
        self.criteria.iter().find(|criterion| &criterion.id == id)
    }

    pub fn category_sum(&self, category: CriterionCategory) -> u32 {
        self.criteria
            .iter()
            .filter(|criterion| criterion.category == category)
            .map(|criterion| u32::from(criterion.max_score))
            .sum()
    }

    pub fn total_points(&self) -> u32 {
        self.criteria
            .iter()
            .map(|criterion| u32::from(criterion.max_score))
            .sum()
    }

    /// Scale each category's raw weights so they sum exactly to its target.
    ///
    /// Each weight becomes `round(raw * target / raw_sum)`; whatever rounding
    /// leaves over (possibly negative) lands on the category's last criterion.
    /// That concentrates the remainder on one criterion and skews its
    /// effective weight slightly, which matches the established behavior of
    /// the scoring sheets this replaces.
    pub fn normalize(&mut self, targets: &ScoreTargets) -> Result<(), TemplateError> {
        for category in CriterionCategory::ordered() {
            self.normalize_category(category, targets.for_category(category))?;
        }
        Ok(())
    }

    fn normalize_category(
        &mut self,
        category: CriterionCategory,
        target: u16,
    ) -> Result<(), TemplateError> {
        let indices: Vec<usize> = self
            .criteria
            .iter()
            .enumerate()
            .filter(|(_, criterion)| criterion.category == category)
            .map(|(index, _)| index)
            .collect();

        if indices.is_empty() {
            if target == 0 {
                return Ok(());
            }
            return Err(TemplateError::EmptyCategory { category, target });
        }

        let raw_sum: u32 = indices
            .iter()
            .map(|&index| u32::from(self.criteria[index].max_score))
            .sum();
        if raw_sum == 0 {
            return Err(TemplateError::ZeroWeights { category, target });
        }

        let scale = f64::from(target) / f64::from(raw_sum);
        let mut rounded_sum: i64 = 0;
        for &index in &indices {
            let scaled = (f64::from(self.criteria[index].max_score) * scale).round();
            self.criteria[index].max_score = scaled as u16;
            rounded_sum += scaled as i64;
        }

        let residual = i64::from(target) - rounded_sum;
        let last = *indices.last().expect("non-empty category");
        let adjusted = i64::from(self.criteria[last].max_score) + residual;
        if adjusted < 0 {
            return Err(TemplateError::TargetUnreachable {
                category,
                criterion: self.criteria[last].id.clone(),
            });
        }
        self.criteria[last].max_score = adjusted as u16;

        Ok(())
    }
}
