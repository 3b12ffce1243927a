//! Fixtures shared by the unit tests.
//!
//! The canonical weights are hand-built rather than trained: hidden unit 0
//! matches a "7" template and feeds class 7, hidden unit 1 matches a "1"
//! template and feeds class 1. Every other parameter is zero.

use burn::{backend::NdArray, module::{Module, Param}, nn::LinearRecord, tensor::{backend::Backend, Data, Shape, Tensor}};

use crate::{data::NormalizedImage, model::{ModelRecord, TopologyConfig, IMAGE_SIZE}, weights};

type Pattern = [[f32; IMAGE_SIZE]; IMAGE_SIZE];

/// Top bar plus a diagonal down to the lower left.
pub(crate) fn seven_pattern() -> Pattern {
    let mut pixels = [[0.0; IMAGE_SIZE]; IMAGE_SIZE];
    for row in 5..=6 {
        for col in 6..=21 {
            pixels[row][col] = 1.0;
        }
    }
    for row in 7..=23 {
        let col = 21 - (row - 7) * 9 / 16;
        pixels[row][col] = 1.0;
        pixels[row][col - 1] = 1.0;
    }
    pixels
}

/// A vertical bar down the middle.
pub(crate) fn one_pattern() -> Pattern {
    let mut pixels = [[0.0; IMAGE_SIZE]; IMAGE_SIZE];
    for row in 4..=23 {
        pixels[row][13] = 1.0;
        pixels[row][14] = 1.0;
    }
    pixels
}

pub(crate) fn seven() -> NormalizedImage {
    NormalizedImage::new(seven_pattern())
}

pub(crate) fn one() -> NormalizedImage {
    NormalizedImage::new(one_pattern())
}

pub(crate) fn checkerboard() -> NormalizedImage {
    let mut pixels = [[0.0; IMAGE_SIZE]; IMAGE_SIZE];
    for (row, values) in pixels.iter_mut().enumerate() {
        for (col, value) in values.iter_mut().enumerate() {
            *value = ((row + col) % 2) as f32;
        }
    }
    NormalizedImage::new(pixels)
}

/// Weight of each pixel for a template detector: +1 on the template, -1 on
/// the competing template's pixels it does not share.
fn detector(template: &Pattern, competitor: &Pattern) -> Vec<f32> {
    template
        .iter()
        .flatten()
        .zip(competitor.iter().flatten())
        .map(|(own, other)| if *own > 0.0 { 1.0 } else if *other > 0.0 { -1.0 } else { 0.0 })
        .collect()
}

fn linear<B: Backend>(weight: Vec<f32>, [d_input, d_output]: [usize; 2], device: &B::Device) -> LinearRecord<B> {
    let weight = Tensor::<B, 2>::from_data(Data::new(weight, Shape::new([d_input, d_output])).convert(), device);
    let bias = Tensor::<B, 1>::zeros([d_output], device);

    LinearRecord {
        weight: Param::from(weight),
        bias: Some(Param::from(bias)),
    }
}

pub(crate) fn canonical_record<B: Backend>(device: &B::Device) -> ModelRecord<B> {
    let [fc1, fc2, fc3] = TopologyConfig::new().layers();
    let (seven, one) = (seven_pattern(), one_pattern());

    // fc1 weights are [pixel, unit]
    let mut w1 = vec![0.0; fc1[0] * fc1[1]];
    let detectors = detector(&seven, &one).into_iter().zip(detector(&one, &seven));
    for (pixel, (seven_weight, one_weight)) in detectors.enumerate() {
        w1[pixel * fc1[1]] = seven_weight;
        w1[pixel * fc1[1] + 1] = one_weight;
    }

    let mut w2 = vec![0.0; fc2[0] * fc2[1]];
    w2[0] = 1.0;
    w2[fc2[1] + 1] = 1.0;

    let mut w3 = vec![0.0; fc3[0] * fc3[1]];
    w3[7] = 1.0;
    w3[fc3[1] + 1] = 1.0;

    ModelRecord {
        fc1: linear(w1, fc1, device),
        fc2: linear(w2, fc2, device),
        fc3: linear(w3, fc3, device),
    }
}

pub(crate) fn canonical_blob() -> Vec<u8> {
    weights::encode(canonical_record::<NdArray<f32>>(&Default::default())).expect("canonical weights encode")
}

/// Finite weights large enough that any inked image overflows the hidden
/// activations to infinity.
pub(crate) fn overflowing_blob() -> Vec<u8> {
    let device = Default::default();
    let [fc1, fc2, _] = TopologyConfig::new().layers();
    let mut record = TopologyConfig::new().init::<NdArray<f32>>(&device).into_record();
    record.fc1.weight = Param::from(Tensor::ones(fc1, &device).mul_scalar(1e30));
    record.fc2.weight = Param::from(Tensor::ones(fc2, &device).mul_scalar(1e30));

    weights::encode(record).expect("overflowing weights encode")
}
