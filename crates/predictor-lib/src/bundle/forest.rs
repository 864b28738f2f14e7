//! Random forest classifier over binary decision trees
//!
//! Each tree is a flat node array rooted at index 0. A split sends a row
//! left when `row[feature] <= threshold`. Leaves hold per-class weights
//! `[fail, pass]`, normalized before averaging across trees.

use super::Classifier;
use anyhow::{bail, ensure, Context, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForest {
    pub n_features: usize,
    pub trees: Vec<DecisionTree>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    pub nodes: Vec<TreeNode>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TreeNode {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        value: [f64; 2],
    },
}

impl DecisionTree {
    /// Children must point forward so traversal always terminates
    fn validate(&self, n_features: usize) -> Result<()> {
        ensure!(!self.nodes.is_empty(), "tree has no nodes");
        for (index, node) in self.nodes.iter().enumerate() {
            match node {
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    ensure!(
                        *feature < n_features,
                        "node {} splits on feature {} of {}",
                        index,
                        feature,
                        n_features
                    );
                    ensure!(threshold.is_finite(), "node {} has a non-finite threshold", index);
                    for child in [left, right] {
                        ensure!(
                            *child > index && *child < self.nodes.len(),
                            "node {} has invalid child {}",
                            index,
                            child
                        );
                    }
                }
                TreeNode::Leaf { value } => {
                    ensure!(
                        value.iter().all(|v| v.is_finite() && *v >= 0.0)
                            && value.iter().sum::<f64>() > 0.0,
                        "leaf {} has invalid class weights {:?}",
                        index,
                        value
                    );
                }
            }
        }
        Ok(())
    }

    /// Normalized class distribution of the leaf reached by `row`
    pub fn leaf_distribution(&self, row: &[f64]) -> Result<[f64; 2]> {
        let mut index = 0;
        loop {
            match self.nodes.get(index).context("tree traversal left the node array")? {
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    let value = row
                        .get(*feature)
                        .with_context(|| format!("row has no feature {}", feature))?;
                    index = if *value <= *threshold { *left } else { *right };
                }
                TreeNode::Leaf { value } => {
                    let total = value[0] + value[1];
                    return Ok([value[0] / total, value[1] / total]);
                }
            }
        }
    }
}

impl RandomForest {
    pub fn validate(&self) -> Result<()> {
        ensure!(self.n_features > 0, "forest declares no features");
        if self.trees.is_empty() {
            bail!("forest has no trees");
        }
        for (i, tree) in self.trees.iter().enumerate() {
            tree.validate(self.n_features)
                .with_context(|| format!("invalid tree {}", i))?;
        }
        Ok(())
    }
}

impl Classifier for RandomForest {
    /// Majority by averaged probability; an exact tie goes to class 0
    fn predict(&self, row: &[f64]) -> Result<i64> {
        let [fail, pass] = self.predict_proba(row)?;
        Ok(if pass > fail { 1 } else { 0 })
    }

    fn predict_proba(&self, row: &[f64]) -> Result<[f64; 2]> {
        ensure!(
            row.len() == self.n_features,
            "row has {} values, model expects {}",
            row.len(),
            self.n_features
        );
        let mut sum = [0.0, 0.0];
        for tree in &self.trees {
            let [fail, pass] = tree.leaf_distribution(row)?;
            sum[0] += fail;
            sum[1] += pass;
        }
        let n = self.trees.len() as f64;
        Ok([sum[0] / n, sum[1] / n])
    }

    fn n_features(&self) -> Option<usize> {
        Some(self.n_features)
    }

    fn kind(&self) -> &'static str {
        "random_forest"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(fail: f64, pass: f64) -> TreeNode {
        TreeNode::Leaf {
            value: [fail, pass],
        }
    }

    fn stump(feature: usize, threshold: f64, below: TreeNode, above: TreeNode) -> DecisionTree {
        DecisionTree {
            nodes: vec![
                TreeNode::Split {
                    feature,
                    threshold,
                    left: 1,
                    right: 2,
                },
                below,
                above,
            ],
        }
    }

    fn forest() -> RandomForest {
        RandomForest {
            n_features: 2,
            trees: vec![
                stump(0, 50.0, leaf(8.0, 2.0), leaf(1.0, 9.0)),
                stump(1, 0.5, leaf(3.0, 1.0), leaf(0.0, 5.0)),
            ],
        }
    }

    #[test]
    fn test_split_goes_left_on_equal() {
        let tree = stump(0, 50.0, leaf(1.0, 0.0), leaf(0.0, 1.0));
        assert_eq!(tree.leaf_distribution(&[50.0]).unwrap(), [1.0, 0.0]);
        assert_eq!(tree.leaf_distribution(&[50.5]).unwrap(), [0.0, 1.0]);
    }

    #[test]
    fn test_probabilities_average_normalized_leaves() {
        let model = forest();
        model.validate().unwrap();

        let [fail, pass] = model.predict_proba(&[70.0, 1.0]).unwrap();
        assert!((pass - 0.95).abs() < 1e-12);
        assert!((fail + pass - 1.0).abs() < 1e-12);

        let [fail, pass] = model.predict_proba(&[10.0, 0.0]).unwrap();
        assert!((fail - 0.775).abs() < 1e-12);
        assert!((fail + pass - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_label_is_argmax_with_tie_to_fail() {
        let model = forest();
        assert_eq!(model.predict(&[70.0, 1.0]).unwrap(), 1);
        assert_eq!(model.predict(&[10.0, 0.0]).unwrap(), 0);

        let tied = RandomForest {
            n_features: 1,
            trees: vec![stump(0, 0.0, leaf(1.0, 1.0), leaf(1.0, 1.0))],
        };
        assert_eq!(tied.predict(&[3.0]).unwrap(), 0);
    }

    #[test]
    fn test_validation_rejects_malformed_trees() {
        let backward = RandomForest {
            n_features: 1,
            trees: vec![DecisionTree {
                nodes: vec![
                    TreeNode::Split {
                        feature: 0,
                        threshold: 1.0,
                        left: 0,
                        right: 1,
                    },
                    leaf(1.0, 0.0),
                ],
            }],
        };
        assert!(backward.validate().is_err());

        let bad_feature = RandomForest {
            n_features: 1,
            trees: vec![stump(3, 1.0, leaf(1.0, 0.0), leaf(0.0, 1.0))],
        };
        assert!(bad_feature.validate().is_err());

        let empty_leaf = RandomForest {
            n_features: 1,
            trees: vec![stump(0, 1.0, leaf(0.0, 0.0), leaf(0.0, 1.0))],
        };
        assert!(empty_leaf.validate().is_err());

        let no_trees = RandomForest {
            n_features: 1,
            trees: vec![],
        };
        assert!(no_trees.validate().is_err());
    }

    #[test]
    fn test_node_json_shape() {
        let node: TreeNode = serde_json::from_str(
            r#"{"type": "split", "feature": 2, "threshold": 8.5, "left": 1, "right": 2}"#,
        )
        .unwrap();
        assert!(matches!(node, TreeNode::Split { feature: 2, .. }));

        let node: TreeNode =
            serde_json::from_str(r#"{"type": "leaf", "value": [3, 7]}"#).unwrap();
        assert_eq!(node, leaf(3.0, 7.0));
    }
}
