//! The standard grid: a small but realistic slice of the reference data.

use crate::{FixtureDb, GapFixture};
use pitwall_db::Result;
use tracing::debug;

const DRIVERS: &[(&str, &str, &str, &str)] = &[
    ("max_verstappen", "Max", "Verstappen", "VER"),
    ("sergio_perez", "Sergio", "Pérez", "PER"),
    ("lewis_hamilton", "Lewis", "Hamilton", "HAM"),
    ("george_russell", "George", "Russell", "RUS"),
    ("charles_leclerc", "Charles", "Leclerc", "LEC"),
    ("carlos_sainz", "Carlos", "Sainz", "SAI"),
    ("lando_norris", "Lando", "Norris", "NOR"),
    ("michael_schumacher", "Michael", "Schumacher", "MSC"),
    ("mick_schumacher", "Mick", "Schumacher", "MSC"),
];

const MODERN_TEAMS: &[(&str, &str)] = &[
    ("max_verstappen", "red_bull"),
    ("sergio_perez", "red_bull"),
    ("lewis_hamilton", "mercedes"),
    ("charles_leclerc", "ferrari"),
    ("carlos_sainz", "ferrari"),
    ("lando_norris", "mclaren"),
];

impl FixtureDb {
    /// Seed the standard grid.
    ///
    /// - Red Bull, Mercedes, Ferrari and McLaren entries for 2021-2024
    ///   (Russell is at Williams in 2021; Norris has no McLaren teammate)
    /// - Mick Schumacher at Haas 2020-2022, Michael Schumacher at Ferrari
    ///   2004-2006 and Mercedes 2010-2012; both share the code `MSC`
    /// - Michael carries more metric rows and laps than Mick
    /// - Monza, Silverstone and Spa, with an alias for Monza
    /// - Red Bull gap summaries: valid in 2022 and 2023, three shared races in 2024
    pub async fn standard_grid() -> Result<Self> {
        let fixture = Self::new().await?;

        for (id, first, last, code) in DRIVERS {
            fixture.add_driver(id, first, last, code).await?;
        }
        fixture.add_driver_alias("checo", "sergio_perez").await?;

        for season in 2021..=2024 {
            for (driver, team) in MODERN_TEAMS {
                fixture.add_entry(season, driver, team).await?;
            }
            let russell_team = if season == 2021 { "williams" } else { "mercedes" };
            fixture.add_entry(season, "george_russell", russell_team).await?;
        }
        for season in 2020..=2022 {
            fixture.add_entry(season, "mick_schumacher", "haas").await?;
        }
        for season in 2004..=2006 {
            fixture.add_entry(season, "michael_schumacher", "ferrari").await?;
        }
        for season in 2010..=2012 {
            fixture.add_entry(season, "michael_schumacher", "mercedes").await?;
        }

        fixture.add_track("monza", "Monza", "Autodromo Nazionale Monza").await?;
        fixture.add_track("silverstone", "Silverstone", "Silverstone Circuit").await?;
        fixture.add_track("spa", "Spa-Francorchamps", "Circuit de Spa-Francorchamps").await?;
        fixture.add_track_alias("Italian Grand Prix", "monza").await?;

        for season in [2004, 2005, 2006, 2010] {
            fixture
                .add_season_metric(season, "michael_schumacher", "season_avg_pace", 0.2, 900)
                .await?;
        }
        fixture
            .add_season_metric(2022, "mick_schumacher", "season_avg_pace", 1.4, 600)
            .await?;
        fixture.add_laps(2006, "monza", "michael_schumacher", 120).await?;
        fixture.add_laps(2022, "monza", "mick_schumacher", 40).await?;
        fixture.add_laps(2023, "silverstone", "max_verstappen", 52).await?;
        fixture
            .add_track_metric(2023, "silverstone", "max_verstappen", "avg_true_pace", 88.4, 48)
            .await?;

        fixture
            .add_teammate_gap(GapFixture {
                shared_races: 22,
                gap_percent: Some(-0.62),
                faster_primary_count: 17,
                ..GapFixture::new(2022, "red_bull", "max_verstappen", "sergio_perez")
            })
            .await?;
        fixture
            .add_teammate_gap(GapFixture {
                shared_races: 20,
                gap_percent: Some(-0.81),
                faster_primary_count: 18,
                ..GapFixture::new(2023, "red_bull", "max_verstappen", "sergio_perez")
            })
            .await?;
        fixture
            .add_teammate_gap(GapFixture {
                shared_races: 3,
                gap_percent: Some(-0.4),
                faster_primary_count: 2,
                coverage_status: "insufficient".to_string(),
                ..GapFixture::new(2024, "red_bull", "max_verstappen", "sergio_perez")
            })
            .await?;
        fixture
            .add_teammate_gap(GapFixture {
                shared_races: 21,
                gap_percent: Some(0.12),
                faster_primary_count: 9,
                ..GapFixture::new(2023, "mercedes", "lewis_hamilton", "george_russell")
            })
            .await?;

        debug!("Seeded standard grid fixture");
        Ok(fixture)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_standard_grid_seeds_reference_rows() {
        let fixture = FixtureDb::standard_grid().await.unwrap();
        let db = fixture.db();

        let drivers = db.driver_name_rows().await.unwrap();
        assert_eq!(drivers.len(), DRIVERS.len());
        let perez = drivers.iter().find(|d| d.driver_id == "sergio_perez").unwrap();
        assert_eq!(perez.aliases, vec!["checo".to_string()]);

        let tracks = db.track_name_rows().await.unwrap();
        assert_eq!(tracks.len(), 3);
    }

    #[tokio::test]
    async fn test_standard_grid_coverage_prefers_michael() {
        let fixture = FixtureDb::standard_grid().await.unwrap();
        let db = fixture.db();

        let michael = db.driver_coverage_score("michael_schumacher", 1000).await.unwrap();
        let mick = db.driver_coverage_score("mick_schumacher", 1000).await.unwrap();
        assert!(michael > mick);
    }
}
