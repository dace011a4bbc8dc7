// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 配置模块
///
/// 处理应用程序的配置设置和环境变量
pub mod config;

/// 领域模块
///
/// 包含核心业务实体、抓取服务和持久化接口
pub mod domain;

/// 引擎模块
///
/// HTTP传输抽象及其 reqwest 实现
pub mod engines;

/// 基础设施模块
///
/// 持久化接口的文件系统和内存实现
pub mod infrastructure;

/// 队列模块
///
/// 先进先出的任务队列
pub mod queue;

/// 工具模块
///
/// 提供通用的工具函数和辅助功能
pub mod utils;

/// 工作器模块
///
/// 后台抓取工作器和生命周期事件
pub mod workers;
