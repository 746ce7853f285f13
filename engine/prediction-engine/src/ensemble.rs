//! Weighted-average ensemble combination

use crate::error::{PredictionError, Result};
use crate::types::{ModelConsensus, ModelPrediction};
use std::collections::BTreeMap;

/// Combine model outputs into one consensus prediction
///
/// Exact weighted average of predictions and confidences, divided by the total
/// weight. Feature-importance maps are merged key by key with the same weights.
/// No outlier rejection.
pub fn combine(predictions: &[&ModelPrediction]) -> Result<ModelPrediction> {
    let total_weight: f64 = predictions.iter().map(|p| p.weight).sum();
    if predictions.is_empty() || total_weight <= 0.0 {
        return Err(PredictionError::Computation("ensemble has no weighted members".into()));
    }

    let prediction = predictions.iter().map(|p| p.prediction * p.weight).sum::<f64>() / total_weight;
    let confidence = predictions.iter().map(|p| p.confidence * p.weight).sum::<f64>() / total_weight;

    let mut feature_importance: BTreeMap<String, f64> = BTreeMap::new();
    for p in predictions {
        for (name, value) in &p.feature_importance {
            *feature_importance.entry(name.clone()).or_insert(0.0) += value * p.weight / total_weight;
        }
    }

    Ok(ModelPrediction { prediction, confidence, weight: 1.0, feature_importance })
}

/// Assemble the named consensus from the four member outputs
pub fn build_consensus(
    linear_regression: ModelPrediction,
    random_forest: ModelPrediction,
    gradient_boosting: ModelPrediction,
    neural_network: ModelPrediction,
) -> Result<ModelConsensus> {
    let ensemble =
        combine(&[&linear_regression, &random_forest, &gradient_boosting, &neural_network])?;

    Ok(ModelConsensus { linear_regression, random_forest, gradient_boosting, neural_network, ensemble })
}
