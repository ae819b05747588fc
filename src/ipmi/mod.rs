/*
 * SPDX-FileCopyrightText: 2025 UnionTech Software Technology Co., Ltd.
 *
 * SPDX-License-Identifier: GPL-2.0-or-later
 */
pub mod bus;
pub mod context;
pub mod ipmi;
pub mod reservation;
pub mod snapshot;
pub mod time;
