// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域模型模块
///
/// 该模块定义了系统的核心业务实体，包括：
/// - 目录数据（catalog）：套装、清单行、抓取结果和清单版本
/// - 任务（job）：排队等待抓取的套装请求
pub mod catalog;
pub mod job;
