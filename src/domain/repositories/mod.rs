// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 仓库接口模块
///
/// 该模块定义了领域层的持久化接口，遵循依赖倒置原则。
/// 具体实现由基础设施层提供，调用方也可以注入自己的实现。
pub mod persistence_sink;
