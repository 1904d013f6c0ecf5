// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license
//
// ONNX Runtime 推理后端
// 负责: 执行提供者选择(加速器 → CPU 回退)、会话加载、前向推理

use std::fmt;

use anyhow::{anyhow, Result};
use log::{info, warn};
use ndarray::{Array, IxDyn};
use ort::execution_providers::{
    CPUExecutionProvider, CUDAExecutionProvider, ExecutionProviderDispatch,
    TensorRTExecutionProvider,
};
use ort::session::Session;
use ort::value::Tensor;

/// 命令行/配置文件中的设备名称
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum Device {
    #[default]
    Cpu,
    Cuda,
    Trt,
}

impl Device {
    pub fn ep(self, device_id: i32) -> OrtEP {
        match self {
            Device::Cpu => OrtEP::CPU,
            Device::Cuda => OrtEP::CUDA(device_id),
            Device::Trt => OrtEP::Trt(device_id),
        }
    }
}

/// 执行提供者 (Execution Provider)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrtEP {
    CPU,
    CUDA(i32),
    Trt(i32),
}

impl OrtEP {
    fn dispatch(&self) -> ExecutionProviderDispatch {
        match *self {
            OrtEP::CPU => CPUExecutionProvider::default().build().error_on_failure(),
            OrtEP::CUDA(id) => CUDAExecutionProvider::default()
                .with_device_id(id)
                .build()
                .error_on_failure(),
            OrtEP::Trt(id) => TensorRTExecutionProvider::default()
                .with_device_id(id)
                .build()
                .error_on_failure(),
        }
    }
}

impl fmt::Display for OrtEP {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrtEP::CPU => write!(f, "CPU"),
            OrtEP::CUDA(id) => write!(f, "CUDA:{}", id),
            OrtEP::Trt(id) => write!(f, "TensorRT:{}", id),
        }
    }
}

#[derive(Debug, Clone)]
pub struct OrtConfig {
    pub ep: OrtEP,
    /// ONNX 模型文件路径
    pub f: String,
    /// 加速器不可用时是否回退到 CPU
    pub cpu_fallback: bool,
}

/// ONNX Runtime 会话
///
/// 由调用方显式持有, 构造时一次性确定执行提供者。
/// 加速器注册失败时:
/// - `cpu_fallback = true`: 记录警告并在 CPU 上重建会话
/// - `cpu_fallback = false`: 直接返回错误
pub struct OrtBackend {
    session: Session,
    ep: OrtEP,
    f: String,
}

impl OrtBackend {
    pub fn build(config: OrtConfig) -> Result<Self> {
        let (session, ep) = match Self::commit(&config.f, config.ep) {
            Ok(session) => (session, config.ep),
            Err(e) if config.cpu_fallback && config.ep != OrtEP::CPU => {
                warn!("⚠️ {} 初始化失败, 回退到 CPU: {:#}", config.ep, e);
                (Self::commit(&config.f, OrtEP::CPU)?, OrtEP::CPU)
            }
            Err(e) => return Err(e),
        };
        info!("✅ 模型加载成功: {} ({})", config.f, ep);

        Ok(Self {
            session,
            ep,
            f: config.f,
        })
    }

    fn commit(f: &str, ep: OrtEP) -> Result<Session> {
        Session::builder()
            .map_err(|e| anyhow!("failed to create ORT session builder: {}", e))?
            .with_execution_providers([ep.dispatch()])
            .map_err(|e| anyhow!("failed to register execution provider {}: {}", ep, e))?
            .commit_from_file(f)
            .map_err(|e| anyhow!("failed to load ONNX model {}: {}", f, e))
    }

    /// 实际使用的执行提供者
    pub fn ep(&self) -> OrtEP {
        self.ep
    }

    pub fn model_path(&self) -> &str {
        &self.f
    }

    /// 前向推理: 单个 4D 输入张量 → 全部输出张量
    pub fn run(&mut self, xs: Array<f32, IxDyn>) -> Result<Vec<Array<f32, IxDyn>>> {
        let shape = <[usize; 4]>::try_from(xs.shape())
            .map_err(|_| anyhow!("expected a 4D input tensor, got shape {:?}", xs.shape()))?;
        let data: Vec<f32> = xs.iter().copied().collect();
        let input = Tensor::from_array((shape, data.into_boxed_slice()))
            .map_err(|e| anyhow!("failed to create input tensor: {}", e))?;

        let outputs = self
            .session
            .run(ort::inputs![input])
            .map_err(|e| anyhow!("inference failed on {}: {}", self.ep, e))?;

        let mut ys = Vec::new();
        for (name, value) in outputs.iter() {
            let (shape, data) = value
                .try_extract_tensor::<f32>()
                .map_err(|e| anyhow!("failed to extract output {}: {}", name, e))?;
            let dims: Vec<usize> = shape.iter().map(|&d| d.max(0) as usize).collect();
            ys.push(Array::from_shape_vec(IxDyn(&dims), data.to_vec())?);
        }
        Ok(ys)
    }
}
