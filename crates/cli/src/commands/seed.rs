use tenderflow_db::{migrations, DemoSeedDataset, SeedResult};

use crate::commands::{with_database, CommandResult};

pub fn run() -> CommandResult {
    let result = with_database("seed", |pool| async move {
        migrations::run_pending(&pool)
            .await
            .map_err(|error| ("migration", error.to_string(), 5u8))?;

        let seeded = DemoSeedDataset::load(&pool)
            .await
            .map_err(|error| ("seed_execution", error.to_string(), 5u8))?;

        let verification = DemoSeedDataset::verify(&pool)
            .await
            .map_err(|error| ("seed_verification", error.to_string(), 6u8))?;
        if !verification.all_present {
            return Err(("seed_verification", verification_failure(&verification.checks), 6u8));
        }

        Ok(seeded)
    });

    match result {
        Ok(seeded) => CommandResult::success("seed", summary(&seeded)),
        Err(failure) => failure,
    }
}

fn summary(seeded: &SeedResult) -> String {
    format!(
        "reference data ready: {} organizations, {} employees, {} responsible links",
        seeded.organizations, seeded.employees, seeded.responsible_links
    )
}

fn verification_failure(checks: &[(&'static str, bool)]) -> String {
    let failed = checks.iter().filter_map(|(check, ok)| (!ok).then_some(*check)).collect::<Vec<_>>();
    if failed.is_empty() {
        "seed verification failed".to_string()
    } else {
        format!("seed verification failed for: {}", failed.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use tenderflow_db::SeedResult;

    use super::{summary, verification_failure};

    #[test]
    fn verification_message_names_failed_checks() {
        let checks = [("Volga Build", true), ("a.volkova", false), ("freelancer", false)];

        assert_eq!(
            verification_failure(&checks),
            "seed verification failed for: a.volkova, freelancer"
        );
    }

    #[test]
    fn verification_message_falls_back_when_nothing_is_named() {
        assert_eq!(verification_failure(&[("Volga Build", true)]), "seed verification failed");
    }

    #[test]
    fn summary_reports_counts() {
        let seeded = SeedResult { organizations: 3, employees: 9, responsible_links: 8 };
        assert_eq!(
            summary(&seeded),
            "reference data ready: 3 organizations, 9 employees, 8 responsible links"
        );
    }
}
