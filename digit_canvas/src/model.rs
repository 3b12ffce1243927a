use burn::{config::Config, module::Module, nn::{Linear, LinearConfig}, tensor::{activation::relu, backend::Backend, Tensor}};

/// Side length of the square image the classifier was trained on.
pub const IMAGE_SIZE: usize = 28;

#[derive(Module, Debug)]
pub struct Model<B: Backend> {
    fc1: Linear<B>,
    fc2: Linear<B>,
    fc3: Linear<B>,
}

/// Layer sizes of the classifier. Shared by the weights loader, which
/// validates uploaded tensors against it, and by the forward pass.
#[derive(Config, Debug, PartialEq)]
pub struct TopologyConfig {
    #[config(default = 784)]
    pub input_size: usize,
    #[config(default = 128)]
    pub hidden_size_1: usize,
    #[config(default = 64)]
    pub hidden_size_2: usize,
    #[config(default = 10)]
    pub num_classes: usize,
}

impl TopologyConfig {
    /// `[d_input, d_output]` of fc1, fc2 and fc3.
    pub fn layers(&self) -> [[usize; 2]; 3] {
        [
            [self.input_size, self.hidden_size_1],
            [self.hidden_size_1, self.hidden_size_2],
            [self.hidden_size_2, self.num_classes],
        ]
    }

    pub fn init<B: Backend>(&self, device: &B::Device) -> Model<B> {
        let [fc1, fc2, fc3] = self.layers();
        Model {
            fc1: LinearConfig::new(fc1[0], fc1[1]).init(device),
            fc2: LinearConfig::new(fc2[0], fc2[1]).init(device),
            fc3: LinearConfig::new(fc3[0], fc3[1]).init(device),
        }
    }

    pub fn init_with<B: Backend>(&self, record: ModelRecord<B>) -> Model<B> {
        let [fc1, fc2, fc3] = self.layers();
        Model {
            fc1: LinearConfig::new(fc1[0], fc1[1]).init_with(record.fc1),
            fc2: LinearConfig::new(fc2[0], fc2[1]).init_with(record.fc2),
            fc3: LinearConfig::new(fc3[0], fc3[1]).init_with(record.fc3),
        }
    }
}

impl<B: Backend> Model<B> {
    pub fn forward(&self, images: Tensor<B, 3>) -> Tensor<B, 2> {
        let [batch_size, height, width] = images.dims();

        // flatten 784
        let x = images.reshape([batch_size, height * width]);

        // fc 1 128
        let x = relu(self.fc1.forward(x));

        // fc 2 64
        let x = relu(self.fc2.forward(x));

        // fc 3 10
        self.fc3.forward(x)
    }
}

#[cfg(test)]
mod tests {
    use burn::{backend::NdArray, tensor::Tensor};

    use super::*;

    type TestBackend = NdArray<f32>;

    #[test]
    fn default_topology_is_the_mnist_classifier() {
        let topology = TopologyConfig::new();
        assert_eq!(topology.layers(), [[784, 128], [128, 64], [64, 10]]);
        assert_eq!(topology.input_size, IMAGE_SIZE * IMAGE_SIZE);
    }

    #[test]
    fn forward_produces_one_logit_row_per_image() {
        let device = Default::default();
        let model = TopologyConfig::new().init::<TestBackend>(&device);

        let images = Tensor::<TestBackend, 3>::zeros([3, IMAGE_SIZE, IMAGE_SIZE], &device);
        let output = model.forward(images);

        assert_eq!(output.dims(), [3, 10]);
    }

    #[test]
    fn init_with_keeps_loaded_parameters() {
        let device = Default::default();
        let topology = TopologyConfig::new();
        let model = topology.init::<TestBackend>(&device);
        let images = Tensor::<TestBackend, 3>::ones([1, IMAGE_SIZE, IMAGE_SIZE], &device);
        let expected = model.forward(images.clone()).into_data();

        let reloaded = topology.init_with::<TestBackend>(model.into_record());

        assert_eq!(reloaded.forward(images).into_data(), expected);
    }
}
