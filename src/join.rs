//! Left join of lift records with the exercise taxonomy.

use polars::prelude::*;

use crate::error::DashError;
use crate::records::{ExerciseTaxonomy, LiftRecord};
use crate::schema::{lifts, taxonomy};

/// A lift with its taxonomy columns; `None` when the exercise is not
/// classified.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifiedLift {
    pub lift: LiftRecord,
    pub anterior_posterior: Option<String>,
    pub push_pull_legs: Option<String>,
}

impl AsRef<LiftRecord> for ClassifiedLift {
    fn as_ref(&self) -> &LiftRecord {
        &self.lift
    }
}

/// Exercise names of `lifts` left-joined with the taxonomy columns, one row
/// per lift in input order. Unmatched rows carry null categories.
pub fn join_frame(
    lifts: &[LiftRecord],
    taxonomy: &ExerciseTaxonomy,
) -> Result<DataFrame, DashError> {
    let keys = DataFrame::new(vec![Column::new(
        lifts::EXERCISE_NAME.into(),
        lifts.iter().map(|l| l.exercise_name.as_str()).collect::<Vec<_>>(),
    )])?;

    let joined = keys
        .lazy()
        .join(
            taxonomy.frame().clone().lazy(),
            [col(lifts::EXERCISE_NAME)],
            [col(taxonomy::EXERCISE_NAME)],
            JoinArgs {
                maintain_order: MaintainOrderJoin::Left,
                ..JoinArgs::new(JoinType::Left)
            },
        )
        .collect()?;
    Ok(joined)
}

/// Every lift survives, matched or not, in input order.
pub fn join_taxonomy(
    lifts: &[LiftRecord],
    taxonomy: &ExerciseTaxonomy,
) -> Result<Vec<ClassifiedLift>, DashError> {
    let joined = join_frame(lifts, taxonomy)?;
    let anatomical = joined.column(taxonomy::ANTERIOR_POSTERIOR)?.str()?;
    let pattern = joined.column(taxonomy::PUSH_PULL_LEGS)?.str()?;

    Ok(lifts
        .iter()
        .enumerate()
        .map(|(i, lift)| ClassifiedLift {
            lift: lift.clone(),
            anterior_posterior: anatomical.get(i).map(str::to_string),
            push_pull_legs: pattern.get(i).map(str::to_string),
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::records::TaxonomyEntry;

    fn taxonomy() -> ExerciseTaxonomy {
        ExerciseTaxonomy::from_entries([
            TaxonomyEntry {
                exercise_name: "Bench Press (Barbell)".into(),
                anterior_posterior: "anterior".into(),
                push_pull_legs: "push".into(),
            },
            TaxonomyEntry {
                exercise_name: "Bench Press (Barbell)".into(),
                anterior_posterior: "posterior".into(),
                push_pull_legs: "pull".into(),
            },
        ])
        .unwrap()
    }

    fn lifts() -> Vec<LiftRecord> {
        let d = NaiveDate::from_ymd_opt(2023, 2, 2).unwrap();
        vec![
            LiftRecord::new("Bench Press (Barbell)", d, 5, 220.0),
            LiftRecord::new("Mystery Machine", d, 10, 80.0),
            LiftRecord::new("Bench Press (Barbell)", d, 3, 230.0),
        ]
    }

    #[test]
    fn repeated_taxonomy_rows_collapse_to_the_first() {
        let taxonomy = taxonomy();
        assert_eq!(taxonomy.len(), 1);
    }

    #[test]
    fn joined_frame_keeps_every_lift_row() {
        let lifts = lifts();
        let joined = join_frame(&lifts, &taxonomy()).unwrap();
        assert_eq!(joined.height(), lifts.len());
        assert_eq!(joined.column(taxonomy::PUSH_PULL_LEGS).unwrap().null_count(), 1);
        assert_eq!(joined.column(taxonomy::ANTERIOR_POSTERIOR).unwrap().null_count(), 1);

        let names: Vec<Option<&str>> = joined
            .column(lifts::EXERCISE_NAME)
            .unwrap()
            .str()
            .unwrap()
            .into_iter()
            .collect();
        assert_eq!(
            names,
            vec![
                Some("Bench Press (Barbell)"),
                Some("Mystery Machine"),
                Some("Bench Press (Barbell)")
            ]
        );
    }

    #[test]
    fn join_is_a_left_join() {
        let lifts = lifts();
        let joined = join_taxonomy(&lifts, &taxonomy()).unwrap();
        assert_eq!(joined.len(), lifts.len());
        assert_eq!(joined[0].push_pull_legs.as_deref(), Some("push"));
        assert_eq!(joined[2].anterior_posterior.as_deref(), Some("anterior"));
        assert_eq!(joined[1].push_pull_legs, None);
        assert_eq!(joined[1].lift, lifts[1]);
    }

    #[test]
    fn empty_inputs_join_cleanly() {
        let empty = ExerciseTaxonomy::from_entries([]).unwrap();
        assert_eq!(empty.len(), 0);
        let joined = join_taxonomy(&lifts(), &empty).unwrap();
        assert!(joined.iter().all(|c| c.push_pull_legs.is_none()));
        assert!(join_taxonomy(&[], &taxonomy()).unwrap().is_empty());
    }
}
