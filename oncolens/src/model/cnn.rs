//! CNN architecture for multi-cancer classification
//!
//! A convolutional backbone with global average pooling feeding a small
//! classification head (Dense 128 + Dropout 0.45 + Dense 16). The backbone
//! is fully convolutional, so input resolution may differ between training
//! and serving. For transfer learning the backbone can be frozen while the
//! head keeps training.

use burn::{
    config::Config,
    module::Module,
    nn::{
        conv::{Conv2d, Conv2dConfig},
        pool::{AdaptiveAvgPool2d, AdaptiveAvgPool2dConfig, MaxPool2d, MaxPool2dConfig},
        BatchNorm, BatchNormConfig, Dropout, DropoutConfig, Linear, LinearConfig, PaddingConfig2d,
        Relu,
    },
    tensor::{backend::Backend, Tensor},
};

/// Smallest input edge the backbone accepts. Four stride-2 pools halve the
/// input, and each feature map must stay at least 1x1.
pub const MIN_IMAGE_SIZE: usize = 16;

/// Configuration for the multi-cancer classifier
#[derive(Config, Debug)]
pub struct CancerClassifierConfig {
    /// Number of output classes
    #[config(default = "16")]
    pub num_classes: usize,

    /// Dropout rate in the classification head
    #[config(default = "0.45")]
    pub dropout_rate: f64,

    /// Number of input channels (3 for RGB)
    #[config(default = "3")]
    pub in_channels: usize,

    /// Base number of convolutional filters
    #[config(default = "32")]
    pub base_filters: usize,

    /// Hidden units in the classification head
    #[config(default = "128")]
    pub head_units: usize,
}

/// A CNN block with Conv2d, BatchNorm, ReLU, and MaxPool
#[derive(Module, Debug)]
pub struct ConvBlock<B: Backend> {
    conv: Conv2d<B>,
    bn: BatchNorm<B>,
    relu: Relu,
    pool: MaxPool2d,
}

impl<B: Backend> ConvBlock<B> {
    pub fn new(in_channels: usize, out_channels: usize, device: &B::Device) -> Self {
        let conv = Conv2dConfig::new([in_channels, out_channels], [3, 3])
            .with_padding(PaddingConfig2d::Same)
            .init(device);
        let bn = BatchNormConfig::new(out_channels).init(device);
        let pool = MaxPool2dConfig::new([2, 2]).with_strides([2, 2]).init();

        Self {
            conv,
            bn,
            relu: Relu::new(),
            pool,
        }
    }

    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        let x = self.conv.forward(x);
        let x = self.bn.forward(x);
        let x = self.relu.forward(x);
        self.pool.forward(x)
    }
}

/// Convolutional feature extractor: 4 blocks with doubling filter counts,
/// closed by global average pooling
#[derive(Module, Debug)]
pub struct Backbone<B: Backend> {
    conv1: ConvBlock<B>,
    conv2: ConvBlock<B>,
    conv3: ConvBlock<B>,
    conv4: ConvBlock<B>,
    global_pool: AdaptiveAvgPool2d,
}

impl<B: Backend> Backbone<B> {
    pub fn new(in_channels: usize, base_filters: usize, device: &B::Device) -> Self {
        let base = base_filters;
        Self {
            conv1: ConvBlock::new(in_channels, base, device),
            conv2: ConvBlock::new(base, base * 2, device),
            conv3: ConvBlock::new(base * 2, base * 4, device),
            conv4: ConvBlock::new(base * 4, base * 8, device),
            global_pool: AdaptiveAvgPool2dConfig::new([1, 1]).init(),
        }
    }

    /// Feature vector of shape [batch_size, base_filters * 8]
    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 2> {
        let x = self.conv1.forward(x);
        let x = self.conv2.forward(x);
        let x = self.conv3.forward(x);
        let x = self.conv4.forward(x);

        let x = self.global_pool.forward(x);
        let [batch_size, channels, _, _] = x.dims();
        x.reshape([batch_size, channels])
    }
}

/// Multi-cancer classifier: backbone + classification head
#[derive(Module, Debug)]
pub struct CancerClassifier<B: Backend> {
    pub backbone: Backbone<B>,
    fc1: Linear<B>,
    dropout: Dropout,
    relu: Relu,
    fc2: Linear<B>,

    num_classes: usize,
}

impl<B: Backend> CancerClassifier<B> {
    /// Create a new classifier from configuration
    pub fn new(config: &CancerClassifierConfig, device: &B::Device) -> Self {
        let backbone = Backbone::new(config.in_channels, config.base_filters, device);
        let feature_dim = config.base_filters * 8;

        let fc1 = LinearConfig::new(feature_dim, config.head_units).init(device);
        let dropout = DropoutConfig::new(config.dropout_rate).init();
        let fc2 = LinearConfig::new(config.head_units, config.num_classes).init(device);

        Self {
            backbone,
            fc1,
            dropout,
            relu: Relu::new(),
            fc2,
            num_classes: config.num_classes,
        }
    }

    /// Forward pass
    ///
    /// # Arguments
    /// * `x` - Input tensor of shape [batch_size, 3, height, width]
    ///
    /// # Returns
    /// * Logits tensor of shape [batch_size, num_classes]
    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 2> {
        let features = self.backbone.forward(x);

        let x = self.fc1.forward(features);
        let x = self.relu.forward(x);
        let x = self.dropout.forward(x);
        self.fc2.forward(x)
    }

    /// Forward pass with softmax for inference
    pub fn forward_softmax(&self, x: Tensor<B, 4>) -> Tensor<B, 2> {
        let logits = self.forward(x);
        burn::tensor::activation::softmax(logits, 1)
    }

    /// Freeze the backbone so only the head receives gradient updates
    pub fn freeze_backbone(mut self) -> Self {
        self.backbone = self.backbone.no_grad();
        self
    }

    /// Get the number of output classes
    pub fn num_classes(&self) -> usize {
        self.num_classes
    }
}
