//! The full fitting pipeline:
//! parametric fit -> discrepancy training per candidate model,
//! then one GP regression baseline over the same data.
//!
//! Components run strictly sequentially. A discrepancy model never begins
//! training unless its parametric fit reported success; a non-converged fit
//! aborts the run with [`GrowthError::OptimizationFailure`].

use crate::discrepancy::DiscrepancyModel;
use crate::domain::{ModelRecord, ModelSnapshot, ObservationSet, PipelineConfig};
use crate::error::GrowthError;
use crate::fit::fit;
use crate::gp::GpRegression;

/// Execute the full pipeline and collect one record per trained instance.
///
/// The returned vector holds one discrepancy record per configured model,
/// in configuration order, followed by a single GP baseline record.
pub fn run_pipeline(
    data: &ObservationSet,
    config: &PipelineConfig,
) -> Result<Vec<ModelRecord>, GrowthError> {
    let mut records = Vec::with_capacity(config.models.len() + 1);

    for &model in &config.models {
        log::info!("fitting model {}", model.display_name());
        let result = fit(model, data)?;
        if !result.success {
            return Err(GrowthError::OptimizationFailure {
                model: model.display_name().to_string(),
                reason: format!(
                    "no convergence after {} iterations (loss {:.6})",
                    result.iterations, result.loss
                ),
            });
        }
        log::info!(
            "model {} converged in {} iterations, loss {:.6}",
            model.display_name(),
            result.iterations,
            result.loss
        );

        let mut dm = DiscrepancyModel::new(
            data.clone(),
            model,
            result.theta.clone(),
            config.noise_init_value,
        )?;
        dm.train(
            config.train.epochs,
            config.train.learning_rate,
            config.progress,
        )?;

        records.push(ModelRecord {
            model_name: model.display_name().to_string(),
            theta: Some(result.theta),
            noise_init_value: config.noise_init_value,
            epochs: config.train.epochs,
            learning_rate: config.train.learning_rate,
            snapshot: ModelSnapshot::Discrepancy(dm.snapshot()),
        });
    }

    log::info!("training GP regression baseline");
    let mut gp = GpRegression::new(data.clone(), config.noise_init_value)?;
    gp.train(config.gp_train.epochs, config.gp_train.learning_rate)?;
    records.push(ModelRecord {
        model_name: "gp".to_string(),
        theta: None,
        noise_init_value: config.noise_init_value,
        epochs: config.gp_train.epochs,
        learning_rate: config.gp_train.learning_rate,
        snapshot: ModelSnapshot::Gp(gp.snapshot()),
    });

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{generate_sample, SampleConfig};
    use crate::domain::TrainSettings;
    use crate::models::GrowthCurve;

    fn test_config(models: Vec<GrowthCurve>) -> PipelineConfig {
        PipelineConfig {
            models,
            noise_init_value: 25.0,
            train: TrainSettings {
                epochs: 30,
                learning_rate: 0.01,
            },
            gp_train: TrainSettings {
                epochs: 60,
                learning_rate: 0.01,
            },
            progress: false,
        }
    }

    #[test]
    fn pipeline_emits_one_record_per_model_plus_gp() {
        let data = generate_sample(&SampleConfig::default()).unwrap();
        let config = test_config(vec![GrowthCurve::Linear, GrowthCurve::Logf]);

        let records = run_pipeline(&data, &config).unwrap();
        assert_eq!(records.len(), 3);

        assert_eq!(records[0].model_name, "linear");
        assert_eq!(records[1].model_name, "logf");
        for record in &records[..2] {
            assert!(record.theta.is_some());
            assert!(matches!(record.snapshot, ModelSnapshot::Discrepancy(_)));
            assert_eq!(record.epochs, 30);
        }

        let gp_record = &records[2];
        assert_eq!(gp_record.model_name, "gp");
        assert!(gp_record.theta.is_none());
        assert_eq!(gp_record.epochs, 60);
        assert!(matches!(gp_record.snapshot, ModelSnapshot::Gp(_)));
    }

    #[test]
    fn records_survive_a_serialization_round_trip() {
        let data = generate_sample(&SampleConfig {
            count: 30,
            ..SampleConfig::default()
        })
        .unwrap();
        let config = test_config(vec![GrowthCurve::Logf]);

        let records = run_pipeline(&data, &config).unwrap();
        let json = serde_json::to_string(&records).unwrap();
        let back: Vec<ModelRecord> = serde_json::from_str(&json).unwrap();
        assert_eq!(back.len(), records.len());
        assert_eq!(back[0].model_name, records[0].model_name);
    }
}
