//! Integration tests for operation dispatch.
//!
//! These launch real kernels; run with `cargo test -- --ignored` on a machine
//! with an NVIDIA GPU and cuDNN installed.

use dnnr::prelude::*;

fn setup() -> CudnnClient {
    CudnnClient::new(0).expect("CUDA device 0 with cuDNN")
}

fn approx_eq(a: f32, b: f32, tol: f32) -> bool {
    (a - b).abs() < tol
}

// =============================================================================
// Activation
// =============================================================================

#[test]
#[ignore = "requires an NVIDIA GPU with cuDNN"]
fn test_activation_forward_in_place_default() {
    let client = setup();
    let x = Tensor::from_slice(&client, &[-1.0f32, 2.0, -3.0, 4.0], &[4]).unwrap();

    let y = client
        .activation_forward(&x, None, &ActivationConfig::default())
        .unwrap();

    // No destination: the result is in the buffer passed as source.
    assert!(y.shares_buffer(&x));
    let data: Vec<f32> = y.to_vec(&client).unwrap();
    assert_eq!(data, vec![0.0, 2.0, 0.0, 4.0]);
}

#[test]
#[ignore = "requires an NVIDIA GPU with cuDNN"]
fn test_activation_forward_sigmoid_out_of_place() {
    let client = setup();
    let x = Tensor::from_slice(&client, &[0.0f32, 0.0], &[2]).unwrap();
    let dst = Tensor::zeros(&client, &[2], DType::F32).unwrap();

    let config = ActivationConfig {
        mode: ActivationMode::Sigmoid,
        ..Default::default()
    };
    let y = client.activation_forward(&x, Some(&dst), &config).unwrap();

    assert!(y.shares_buffer(&dst));
    assert!(!y.shares_buffer(&x));
    let data: Vec<f32> = y.to_vec(&client).unwrap();
    for v in data {
        assert!(approx_eq(v, 0.5, 1e-6));
    }
}

#[test]
#[ignore = "requires an NVIDIA GPU with cuDNN"]
fn test_activation_backward_relu_masks_gradient() {
    let client = setup();
    let x = Tensor::from_slice(&client, &[-1.0f32, 2.0, -3.0, 4.0], &[4]).unwrap();
    let y = client
        .activation_forward(&x, Some(&Tensor::zeros(&client, &[4], DType::F32).unwrap()), &ActivationConfig::default())
        .unwrap();
    let dy = Tensor::from_slice(&client, &[1.0f32, 1.0, 1.0, 1.0], &[4]).unwrap();

    let dx = client
        .activation_backward(&y, &dy, &x, None, &ActivationConfig::default())
        .unwrap();

    // Gradient lands in dy's buffer by default.
    assert!(dx.shares_buffer(&dy));
    let data: Vec<f32> = dx.to_vec(&client).unwrap();
    assert_eq!(data, vec![0.0, 1.0, 0.0, 1.0]);
}

// =============================================================================
// Softmax
// =============================================================================

#[test]
#[ignore = "requires an NVIDIA GPU with cuDNN"]
fn test_softmax_instances_sum_to_one() {
    let client = setup();
    // Two instances of three channel values each: host dims (1,1,C,N).
    let x = Tensor::from_slice(
        &client,
        &[1.0f32, 2.0, 3.0, -1.0, 0.0, 1.0],
        &[1, 1, 3, 2],
    )
    .unwrap();

    let y = client
        .softmax_forward(&x, None, &SoftmaxConfig::default())
        .unwrap();
    assert!(y.shares_buffer(&x));

    let data: Vec<f32> = y.to_vec(&client).unwrap();
    let first: f32 = data[..3].iter().sum();
    let second: f32 = data[3..].iter().sum();
    assert!(approx_eq(first, 1.0, 1e-5));
    assert!(approx_eq(second, 1.0, 1e-5));
    // Larger logits get larger probabilities.
    assert!(data[0] < data[1] && data[1] < data[2]);
}

#[test]
#[ignore = "requires an NVIDIA GPU with cuDNN"]
fn test_softmax_backward_default_destination() {
    let client = setup();
    let x = Tensor::from_slice(&client, &[1.0f32, 2.0, 3.0], &[1, 1, 3, 1]).unwrap();
    let y = client
        .softmax_forward(
            &x,
            Some(&Tensor::zeros(&client, &[1, 1, 3, 1], DType::F32).unwrap()),
            &SoftmaxConfig::default(),
        )
        .unwrap();
    let dy = Tensor::from_slice(&client, &[0.5f32, 0.0, -0.5], &[1, 1, 3, 1]).unwrap();

    let dx = client
        .softmax_backward(&y, &dy, None, &SoftmaxConfig::default())
        .unwrap();
    assert!(dx.shares_buffer(&dy));

    // A softmax gradient is orthogonal to the all-ones direction.
    let data: Vec<f32> = dx.to_vec(&client).unwrap();
    let sum: f32 = data.iter().sum();
    assert!(approx_eq(sum, 0.0, 1e-5));
}

// =============================================================================
// Pooling
// =============================================================================

#[test]
#[ignore = "requires an NVIDIA GPU with cuDNN"]
fn test_pooling_max_2x2() {
    let client = setup();
    // 4x4 image, values 1..=16 in column-major order.
    let data: Vec<f32> = (1..=16).map(|v| v as f32).collect();
    let x = Tensor::from_slice(&client, &data, &[4, 4, 1, 1]).unwrap();

    let pool = PoolingDescriptor::new(PoolingMode::Max, &[2, 2], &[0, 0], &[2, 2]).unwrap();
    let y = client
        .pooling_forward(&pool, &x, None, &PoolingConfig::default())
        .unwrap();

    assert_eq!(y.dims(), &[2, 2, 1, 1]);
    let out: Vec<f32> = y.to_vec(&client).unwrap();
    assert_eq!(out, vec![6.0, 8.0, 14.0, 16.0]);
}

#[test]
#[ignore = "requires an NVIDIA GPU with cuDNN"]
fn test_pooling_average_modes_differ_with_padding() {
    let client = setup();
    let x = Tensor::from_slice(&client, &[4.0f32; 4], &[2, 2, 1, 1]).unwrap();
    let config = PoolingConfig::default();

    // With a padded 2x2 window at stride 2, the corner output averages one
    // real element with three padded zeros.
    let include =
        PoolingDescriptor::new(PoolingMode::AverageIncludePadding, &[2, 2], &[1, 1], &[2, 2])
            .unwrap();
    let exclude =
        PoolingDescriptor::new(PoolingMode::AverageExcludePadding, &[2, 2], &[1, 1], &[2, 2])
            .unwrap();

    let with_pad: Vec<f32> = client
        .pooling_forward(&include, &x, None, &config)
        .unwrap()
        .to_vec(&client)
        .unwrap();
    let without_pad: Vec<f32> = client
        .pooling_forward(&exclude, &x, None, &config)
        .unwrap()
        .to_vec(&client)
        .unwrap();

    assert!(approx_eq(with_pad[0], 1.0, 1e-5));
    assert!(approx_eq(without_pad[0], 4.0, 1e-5));
}

#[test]
#[ignore = "requires an NVIDIA GPU with cuDNN"]
fn test_pooling_backward_allocates_input_shaped_gradient() {
    let client = setup();
    let data: Vec<f32> = (1..=16).map(|v| v as f32).collect();
    let x = Tensor::from_slice(&client, &data, &[4, 4, 1, 1]).unwrap();
    let pool = PoolingDescriptor::new(PoolingMode::Max, &[2, 2], &[0, 0], &[2, 2]).unwrap();
    let config = PoolingConfig::default();

    let y = client.pooling_forward(&pool, &x, None, &config).unwrap();
    let dy = Tensor::from_slice(&client, &[1.0f32; 4], &[2, 2, 1, 1]).unwrap();

    let dx = client
        .pooling_backward(&pool, &y, &dy, &x, None, &config)
        .unwrap();

    assert_eq!(dx.dims(), x.dims());
    let grad: Vec<f32> = dx.to_vec(&client).unwrap();
    // Gradient routes to each window's max element only.
    assert_eq!(grad.iter().filter(|&&g| g != 0.0).count(), 4);
    assert!(approx_eq(grad.iter().sum::<f32>(), 4.0, 1e-5));
}

// =============================================================================
// Tensor ops
// =============================================================================

#[test]
#[ignore = "requires an NVIDIA GPU with cuDNN"]
fn test_set_and_scale_tensor() {
    let client = setup();
    let x = Tensor::zeros(&client, &[2, 2, 1, 1], DType::F32).unwrap();

    client.set_tensor(&x, 3.0).unwrap();
    client.scale_tensor(&x, 2.0).unwrap();

    let data: Vec<f32> = x.to_vec(&client).unwrap();
    assert_eq!(data, vec![6.0; 4]);
}

#[test]
#[ignore = "requires an NVIDIA GPU with cuDNN"]
fn test_transform_scaled_copy() {
    let client = setup();
    let x = Tensor::from_slice(&client, &[1.0f32, 2.0, 3.0, 4.0], &[4]).unwrap();

    let config = TransformConfig {
        alpha: 2.0,
        ..Default::default()
    };
    let y = client.transform(&x, None, &config).unwrap();

    assert!(!y.shares_buffer(&x));
    let data: Vec<f32> = y.to_vec(&client).unwrap();
    assert_eq!(data, vec![2.0, 4.0, 6.0, 8.0]);
}

#[test]
#[ignore = "requires an NVIDIA GPU with cuDNN"]
fn test_add_same_c_bias() {
    let client = setup();
    // Destination: 2x2 spatial, 3 channels, batch 1, all ones.
    let dst = Tensor::zeros(&client, &[2, 2, 3, 1], DType::F32).unwrap();
    client.set_tensor(&dst, 1.0).unwrap();
    let bias = Tensor::from_slice(&client, &[10.0f32, 20.0, 30.0], &[1, 1, 3, 1]).unwrap();

    let config = AddConfig {
        mode: AddMode::SameC,
        ..Default::default()
    };
    client.add(&bias, &dst, &config).unwrap();

    let data: Vec<f32> = dst.to_vec(&client).unwrap();
    // Column-major: each channel's 2x2 plane is contiguous.
    assert_eq!(&data[..4], &[11.0; 4]);
    assert_eq!(&data[4..8], &[21.0; 4]);
    assert_eq!(&data[8..], &[31.0; 4]);
}

#[test]
#[ignore = "requires an NVIDIA GPU with cuDNN"]
fn test_add_rejects_wrong_bias_shape() {
    let client = setup();
    let dst = Tensor::zeros(&client, &[2, 2, 3, 1], DType::F32).unwrap();
    let bias = Tensor::from_slice(&client, &[1.0f32, 2.0], &[1, 1, 2, 1]).unwrap();

    let config = AddConfig {
        mode: AddMode::SameC,
        ..Default::default()
    };
    let result = client.add(&bias, &dst, &config);
    assert!(matches!(result, Err(Error::ShapeMismatch { .. })));
}

// =============================================================================
// Convolution
// =============================================================================

#[test]
#[ignore = "requires an NVIDIA GPU with cuDNN"]
fn test_conv_forward_1x1_filter_scales_input() {
    let client = setup();
    let x = Tensor::from_slice(&client, &[1.0f32, 2.0, 3.0, 4.0], &[2, 2, 1, 1]).unwrap();
    let w = Tensor::from_slice(&client, &[2.0f32], &[1, 1, 1, 1]).unwrap();

    let conv = ConvolutionDescriptor::new(
        ConvolutionMode::CrossCorrelation,
        &[0, 0],
        &[1, 1],
        &[1, 1],
        DType::F32,
    )
    .unwrap();

    let y = client
        .conv_forward(&conv, &x, &w, None, None, &ConvFwdConfig::default())
        .unwrap();

    assert_eq!(y.dims(), &[2, 2, 1, 1]);
    let data: Vec<f32> = y.to_vec(&client).unwrap();
    assert_eq!(data, vec![2.0, 4.0, 6.0, 8.0]);
}

#[test]
#[ignore = "requires an NVIDIA GPU with cuDNN"]
fn test_conv_forward_output_shape_matches_query() {
    let client = setup();
    let x = Tensor::zeros(&client, &[28, 28, 3, 2], DType::F32).unwrap();
    let w = Tensor::zeros(&client, &[5, 5, 3, 8], DType::F32).unwrap();

    let conv = ConvolutionDescriptor::new(
        ConvolutionMode::CrossCorrelation,
        &[0, 0],
        &[1, 1],
        &[1, 1],
        DType::F32,
    )
    .unwrap();

    let y = client
        .conv_forward(&conv, &x, &w, None, None, &ConvFwdConfig::default())
        .unwrap();
    assert_eq!(y.dims(), &[24, 24, 8, 2]);
}

#[test]
#[ignore = "requires an NVIDIA GPU with cuDNN"]
fn test_conv_forward_reuses_and_grows_workspace() {
    let client = setup();
    let mut workspace = Workspace::new(&client);
    let conv = ConvolutionDescriptor::new(
        ConvolutionMode::CrossCorrelation,
        &[0, 0],
        &[1, 1],
        &[1, 1],
        DType::F32,
    )
    .unwrap();
    let config = ConvFwdConfig {
        algo: ConvFwdAlgo::ImplicitPrecompGemm,
        ..Default::default()
    };

    let x = Tensor::zeros(&client, &[8, 8, 1, 1], DType::F32).unwrap();
    let w = Tensor::zeros(&client, &[3, 3, 1, 4], DType::F32).unwrap();
    client
        .conv_forward(&conv, &x, &w, None, Some(&mut workspace), &config)
        .unwrap();
    let after_small = workspace.size_bytes();

    let x = Tensor::zeros(&client, &[64, 64, 3, 4], DType::F32).unwrap();
    let w = Tensor::zeros(&client, &[3, 3, 3, 16], DType::F32).unwrap();
    client
        .conv_forward(&conv, &x, &w, None, Some(&mut workspace), &config)
        .unwrap();

    // The workspace only ever grows.
    assert!(workspace.size_bytes() >= after_small);
}

#[test]
#[ignore = "requires an NVIDIA GPU with cuDNN"]
fn test_conv_backward_bias_shape() {
    let client = setup();
    let dy = Tensor::zeros(&client, &[4, 4, 5, 2], DType::F32).unwrap();
    client.set_tensor(&dy, 1.0).unwrap();

    let db = client
        .conv_backward_bias(&dy, None, &ConvBwdBiasConfig::default())
        .unwrap();

    assert_eq!(db.dims(), &[1, 1, 5, 1]);
    let data: Vec<f32> = db.to_vec(&client).unwrap();
    // Each channel sums 4*4 spatial positions over 2 images.
    for v in data {
        assert!(approx_eq(v, 32.0, 1e-4));
    }
}

#[test]
#[ignore = "requires an NVIDIA GPU with cuDNN"]
fn test_conv_backward_filter_and_data_run() {
    let client = setup();
    let conv = ConvolutionDescriptor::new(
        ConvolutionMode::CrossCorrelation,
        &[0, 0],
        &[1, 1],
        &[1, 1],
        DType::F32,
    )
    .unwrap();

    let x = Tensor::from_slice(&client, &[1.0f32; 16], &[4, 4, 1, 1]).unwrap();
    let w = Tensor::from_slice(&client, &[1.0f32; 9], &[3, 3, 1, 1]).unwrap();
    let y = client
        .conv_forward(&conv, &x, &w, None, None, &ConvFwdConfig::default())
        .unwrap();
    assert_eq!(y.dims(), &[2, 2, 1, 1]);

    let dy = Tensor::from_slice(&client, &[1.0f32; 4], &[2, 2, 1, 1]).unwrap();

    let dw = Tensor::zeros(&client, &[3, 3, 1, 1], DType::F32).unwrap();
    client
        .conv_backward_filter(&conv, &x, &dy, &dw, None, &ConvBwdFilterConfig::default())
        .unwrap();
    // Every filter tap sees four ones.
    let dw_data: Vec<f32> = dw.to_vec(&client).unwrap();
    for v in dw_data {
        assert!(approx_eq(v, 4.0, 1e-4));
    }

    let dx = Tensor::zeros(&client, &[4, 4, 1, 1], DType::F32).unwrap();
    client
        .conv_backward_data(&conv, &w, &dy, &dx, None, &ConvBwdDataConfig::default())
        .unwrap();
    // The center of the input receives contributions from all four outputs.
    let dx_data: Vec<f32> = dx.to_vec(&client).unwrap();
    assert!(approx_eq(dx_data.iter().sum::<f32>(), 36.0, 1e-4));
}
