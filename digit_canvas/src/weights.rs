//! Reading and writing the weights blob.
//!
//! The blob is a safetensors buffer holding the `state_dict` of the PyTorch
//! network `Sequential(Flatten, Linear, ReLU, Linear, ReLU, Linear)`, as
//! written by `safetensors.torch.save_file(model.state_dict(), ...)`. Every
//! tensor is F32 and linear weights are stored `[d_output, d_input]`.

use burn::{module::Param, nn::LinearRecord, tensor::{backend::Backend, Data, Shape, Tensor}};
use safetensors::{tensor::TensorView, Dtype, SafeTensors};

use crate::{error::LoadError, model::{ModelRecord, TopologyConfig}};

/// State-dict prefixes of the three linear layers. Flatten and the two
/// ReLUs occupy indices 0, 2 and 4 of the Sequential.
const LAYER_PREFIXES: [&str; 3] = ["1", "3", "5"];

/// Decodes a weights blob into a record for `topology`.
///
/// Fails when the buffer is not valid safetensors, when a tensor is missing,
/// unexpected, not F32, shaped differently from the topology, or holds NaN
/// or infinite values.
pub fn decode<B: Backend>(bytes: &[u8], topology: &TopologyConfig, device: &B::Device) -> Result<ModelRecord<B>, LoadError> {
    let tensors = SafeTensors::deserialize(bytes).map_err(|err| LoadError::Decode(format!("{err:?}")))?;

    let expected = tensor_names();
    if let Some(name) = tensors.names().into_iter().find(|name| !expected.contains(*name)) {
        return Err(LoadError::UnexpectedTensor { name: name.clone() });
    }

    let [fc1, fc2, fc3] = topology.layers();
    Ok(ModelRecord {
        fc1: read_linear(&tensors, LAYER_PREFIXES[0], fc1, device)?,
        fc2: read_linear(&tensors, LAYER_PREFIXES[1], fc2, device)?,
        fc3: read_linear(&tensors, LAYER_PREFIXES[2], fc3, device)?,
    })
}

/// Encodes a record back into the blob format accepted by [`decode`].
pub fn encode<B: Backend>(record: ModelRecord<B>) -> Result<Vec<u8>, LoadError> {
    let mut entries = Vec::with_capacity(LAYER_PREFIXES.len() * 2);
    for (prefix, linear) in LAYER_PREFIXES.iter().zip([record.fc1, record.fc2, record.fc3]) {
        let bias = linear
            .bias
            .ok_or_else(|| LoadError::Encode(format!("layer {prefix} has no bias")))?;

        entries.push(entry(format!("{prefix}.weight"), linear.weight.val().transpose().into_data().convert()));
        entries.push(entry(format!("{prefix}.bias"), bias.val().into_data().convert()));
    }

    let views = entries
        .iter()
        .map(|(name, shape, bytes)| TensorView::new(Dtype::F32, shape.clone(), bytes).map(|view| (name.clone(), view)))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|err| LoadError::Encode(format!("{err:?}")))?;

    safetensors::serialize(views, &None).map_err(|err| LoadError::Encode(format!("{err:?}")))
}

fn tensor_names() -> Vec<String> {
    LAYER_PREFIXES
        .iter()
        .flat_map(|prefix| [format!("{prefix}.weight"), format!("{prefix}.bias")])
        .collect()
}

fn entry<const D: usize>(name: String, data: Data<f32, D>) -> (String, Vec<usize>, Vec<u8>) {
    let shape = data.shape.dims.to_vec();
    let bytes = data.value.iter().flat_map(|value| value.to_le_bytes()).collect();
    (name, shape, bytes)
}

fn read_linear<B: Backend>(tensors: &SafeTensors, prefix: &str, [d_input, d_output]: [usize; 2], device: &B::Device) -> Result<LinearRecord<B>, LoadError> {
    let weight = read_f32(tensors, &format!("{prefix}.weight"), &[d_output, d_input])?;
    let bias = read_f32(tensors, &format!("{prefix}.bias"), &[d_output])?;

    // burn keeps linear weights as [d_input, d_output]
    let weight = Tensor::<B, 2>::from_data(Data::new(weight, Shape::new([d_output, d_input])).convert(), device).transpose();
    let bias = Tensor::<B, 1>::from_data(Data::new(bias, Shape::new([d_output])).convert(), device);

    Ok(LinearRecord {
        weight: Param::from(weight),
        bias: Some(Param::from(bias)),
    })
}

fn read_f32(tensors: &SafeTensors, name: &str, expected: &[usize]) -> Result<Vec<f32>, LoadError> {
    let view = tensors
        .tensor(name)
        .map_err(|_| LoadError::MissingTensor { name: name.to_string() })?;

    if view.dtype() != Dtype::F32 {
        return Err(LoadError::Dtype { name: name.to_string(), found: format!("{:?}", view.dtype()) });
    }
    if view.shape() != expected {
        return Err(LoadError::ShapeMismatch { name: name.to_string(), expected: expected.to_vec(), found: view.shape().to_vec() });
    }

    let values: Vec<f32> = view
        .data()
        .chunks_exact(4)
        .map(|bytes| f32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
        .collect();
    if !values.iter().all(|value| value.is_finite()) {
        return Err(LoadError::NonFinite { name: name.to_string() });
    }

    Ok(values)
}
