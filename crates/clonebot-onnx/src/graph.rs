//! Protobuf graph construction.
//!
//! Both exported model families share the same building blocks: a `Gemm`
//! node per dense layer (weights stored `[out, in]`, `transB = 1`), an
//! activation node where the layer has one, and a leading dynamic
//! `batch_size` dimension on the graph input and output.

use std::{fs, path::Path};

use anyhow::Context as _;
use clonebot_net::{Activation, Linear, Mlp, PolicyNetwork};
use prost::Message as _;
use tract_onnx::pb::{
    AttributeProto, GraphProto, ModelProto, NodeProto, OperatorSetIdProto, TensorProto,
    TensorShapeProto, TypeProto, ValueInfoProto, attribute_proto, tensor_proto,
    tensor_shape_proto, type_proto,
};

const IR_VERSION: i64 = 7;
const OPSET_VERSION: i64 = 11;
const PRODUCER_NAME: &str = "clonebot";

struct GraphBuilder {
    nodes: Vec<NodeProto>,
    initializers: Vec<TensorProto>,
}

impl GraphBuilder {
    fn new() -> Self {
        Self {
            nodes: Vec::new(),
            initializers: Vec::new(),
        }
    }

    /// Adds `Gemm(input, W, b)` with `transB = 1`; returns the output
    /// tensor name.
    fn gemm(&mut self, input: &str, layer: &Linear, prefix: &str) -> String {
        let weight_name = format!("{prefix}.weight");
        let bias_name = format!("{prefix}.bias");
        self.initializers.push(tensor_f32(
            &weight_name,
            &[layer.out_dim as i64, layer.in_dim as i64],
            &layer.weight,
        ));
        self.initializers
            .push(tensor_f32(&bias_name, &[layer.out_dim as i64], &layer.bias));

        let output = format!("{prefix}.out");
        self.nodes.push(NodeProto {
            input: vec![input.to_owned(), weight_name, bias_name],
            output: vec![output.clone()],
            name: format!("{prefix}.gemm"),
            op_type: "Gemm".to_owned(),
            attribute: vec![
                attr_f("alpha", 1.0),
                attr_f("beta", 1.0),
                attr_i("transB", 1),
            ],
            ..Default::default()
        });
        output
    }

    fn activation(&mut self, input: &str, activation: Activation, prefix: &str) -> String {
        let output = format!("{prefix}.act");
        self.nodes.push(NodeProto {
            input: vec![input.to_owned()],
            output: vec![output.clone()],
            name: format!("{prefix}.{}", activation.op_name().to_lowercase()),
            op_type: activation.op_name().to_owned(),
            ..Default::default()
        });
        output
    }

    fn concat(&mut self, inputs: &[String], output: &str) {
        self.nodes.push(NodeProto {
            input: inputs.to_vec(),
            output: vec![output.to_owned()],
            name: format!("{output}.concat"),
            op_type: "Concat".to_owned(),
            attribute: vec![attr_i("axis", 1)],
            ..Default::default()
        });
    }

    fn finish(
        self,
        graph_name: &str,
        input: (&str, usize),
        output: (&str, usize),
    ) -> ModelProto {
        ModelProto {
            ir_version: IR_VERSION,
            producer_name: PRODUCER_NAME.to_owned(),
            producer_version: env!("CARGO_PKG_VERSION").to_owned(),
            opset_import: vec![OperatorSetIdProto {
                domain: String::new(),
                version: OPSET_VERSION,
            }],
            graph: Some(GraphProto {
                node: self.nodes,
                name: graph_name.to_owned(),
                initializer: self.initializers,
                input: vec![batched_value_info(input.0, input.1)],
                output: vec![batched_value_info(output.0, output.1)],
                ..Default::default()
            }),
            ..Default::default()
        }
    }
}

/// Converts a synthesized test network. Graph I/O is named
/// `input`/`output`.
#[must_use]
pub fn model_from_mlp(network: &Mlp) -> ModelProto {
    let mut builder = GraphBuilder::new();
    let mut current = "input".to_owned();
    for (i, layer) in network.layers().iter().enumerate() {
        current = builder.gemm(&current, &layer.linear, &format!("fc{i}"));
        if let Some(activation) = layer.activation {
            current = builder.activation(&current, activation, &format!("fc{i}"));
        }
    }
    rename_output(&mut builder.nodes, &current, "output");
    builder.finish(
        "test_model",
        ("input", network.input_size()),
        ("output", network.output_size()),
    )
}

/// Converts a trained policy. Graph I/O is named `features`/`actions`;
/// dropout is a training-time concern and has no node in the exported
/// graph.
#[must_use]
pub fn model_from_policy(network: &PolicyNetwork) -> ModelProto {
    let mut builder = GraphBuilder::new();
    let mut current = "features".to_owned();
    for (i, layer) in network.hidden_layers().iter().enumerate() {
        current = builder.gemm(&current, layer, &format!("trunk{i}"));
        current = builder.activation(&current, Activation::Relu, &format!("trunk{i}"));
    }

    let cont = builder.gemm(&current, network.continuous_head(), "continuous");
    let cont = builder.activation(&cont, Activation::Tanh, "continuous");
    let bin = builder.gemm(&current, network.binary_head(), "binary");
    let bin = builder.activation(&bin, Activation::Sigmoid, "binary");
    builder.concat(&[cont, bin], "actions");

    builder.finish(
        "behavior_clone_policy",
        ("features", network.input_size()),
        ("actions", network.output_size()),
    )
}

/// Serializes the model to `path`, creating parent directories as needed.
pub fn write_model(model: &ModelProto, path: &Path) -> anyhow::Result<()> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)
            .with_context(|| format!("failed to create directory {}", dir.display()))?;
    }
    fs::write(path, model.encode_to_vec())
        .with_context(|| format!("failed to write model {}", path.display()))
}

fn rename_output(nodes: &mut [NodeProto], from: &str, to: &str) {
    for node in nodes {
        for output in &mut node.output {
            if output == from {
                to.clone_into(output);
            }
        }
        for input in &mut node.input {
            if input == from {
                to.clone_into(input);
            }
        }
    }
}

fn attr_i(name: &str, value: i64) -> AttributeProto {
    AttributeProto {
        name: name.to_owned(),
        r#type: attribute_proto::AttributeType::Int as i32,
        i: value,
        ..Default::default()
    }
}

fn attr_f(name: &str, value: f32) -> AttributeProto {
    AttributeProto {
        name: name.to_owned(),
        r#type: attribute_proto::AttributeType::Float as i32,
        f: value,
        ..Default::default()
    }
}

fn tensor_f32(name: &str, dims: &[i64], data: &[f32]) -> TensorProto {
    TensorProto {
        name: name.to_owned(),
        dims: dims.to_vec(),
        data_type: tensor_proto::DataType::Float as i32,
        float_data: data.to_vec(),
        ..Default::default()
    }
}

/// `[batch_size, width]` f32 tensor declaration.
fn batched_value_info(name: &str, width: usize) -> ValueInfoProto {
    let dim = vec![
        tensor_shape_proto::Dimension {
            value: Some(tensor_shape_proto::dimension::Value::DimParam(
                "batch_size".to_owned(),
            )),
            ..Default::default()
        },
        tensor_shape_proto::Dimension {
            value: Some(tensor_shape_proto::dimension::Value::DimValue(width as i64)),
            ..Default::default()
        },
    ];
    ValueInfoProto {
        name: name.to_owned(),
        r#type: Some(TypeProto {
            value: Some(type_proto::Value::TensorType(type_proto::Tensor {
                elem_type: tensor_proto::DataType::Float as i32,
                shape: Some(TensorShapeProto { dim }),
            })),
            ..Default::default()
        }),
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use rand_pcg::Pcg64Mcg;

    use super::*;

    #[test]
    fn test_mlp_graph_shape() {
        let mut rng = Pcg64Mcg::new(1);
        let net = Mlp::random(&[16, 8, 4], Some(Activation::Tanh), &mut rng);
        let model = model_from_mlp(&net);
        let graph = model.graph.unwrap();

        assert_eq!(graph.input[0].name, "input");
        assert_eq!(graph.output[0].name, "output");
        // Two Gemm nodes plus ReLU and the final Tanh.
        assert_eq!(graph.node.len(), 4);
        assert_eq!(graph.initializer.len(), 4);
        assert_eq!(graph.node.last().unwrap().output, vec!["output"]);
    }

    #[test]
    fn test_policy_graph_heads_and_concat() {
        let mut rng = Pcg64Mcg::new(2);
        let net = PolicyNetwork::random(56, &[128, 64, 32], 0.2, &mut rng);
        let model = model_from_policy(&net);
        let graph = model.graph.unwrap();

        assert_eq!(graph.input[0].name, "features");
        assert_eq!(graph.output[0].name, "actions");
        let ops: Vec<&str> = graph.node.iter().map(|n| n.op_type.as_str()).collect();
        assert_eq!(ops.iter().filter(|o| **o == "Gemm").count(), 5);
        assert!(ops.contains(&"Tanh"));
        assert!(ops.contains(&"Sigmoid"));
        assert!(!ops.contains(&"Dropout"));
        assert_eq!(ops.last(), Some(&"Concat"));
    }

    #[test]
    fn test_opset_and_batch_dim() {
        let mut rng = Pcg64Mcg::new(3);
        let net = Mlp::random(&[64, 32, 10], Some(Activation::Tanh), &mut rng);
        let model = model_from_mlp(&net);
        assert_eq!(model.opset_import[0].version, OPSET_VERSION);

        let graph = model.graph.unwrap();
        let Some(type_proto::Value::TensorType(tensor)) = graph.input[0]
            .r#type
            .as_ref()
            .and_then(|t| t.value.as_ref())
        else {
            panic!("input is not a tensor type");
        };
        let shape = tensor.shape.as_ref().unwrap();
        assert!(matches!(
            shape.dim[0].value,
            Some(tensor_shape_proto::dimension::Value::DimParam(ref p)) if p == "batch_size"
        ));
        assert!(matches!(
            shape.dim[1].value,
            Some(tensor_shape_proto::dimension::Value::DimValue(64))
        ));
    }
}
