//! Market theme and color utilities.

use crate::toasts::ToastLevel;
use ratatui::style::Color;
use shopfront_core::{OrderStatus, ShipmentStatus};

#[derive(Debug, Clone)]
pub struct MarketTheme {
    pub bg: Color,
    pub primary: Color,
    pub primary_dim: Color,
    pub secondary: Color,
    pub success: Color,
    pub warning: Color,
    pub error: Color,
    pub info: Color,
    pub text: Color,
    pub text_dim: Color,
    pub text_muted: Color,
    pub border: Color,
    pub border_focus: Color,
}

impl MarketTheme {
    pub fn market() -> Self {
        Self {
            bg: Color::Rgb(16, 16, 20),
            primary: Color::Rgb(94, 234, 212),
            primary_dim: Color::Rgb(45, 122, 111),
            secondary: Color::Rgb(250, 204, 21),
            success: Color::Rgb(74, 222, 128),
            warning: Color::Rgb(251, 146, 60),
            error: Color::Rgb(248, 113, 113),
            info: Color::Rgb(125, 211, 252),
            text: Color::Rgb(235, 235, 235),
            text_dim: Color::Rgb(140, 140, 140),
            text_muted: Color::Rgb(80, 80, 80),
            border: Color::Rgb(70, 70, 80),
            border_focus: Color::Rgb(94, 234, 212),
        }
    }
}

pub fn order_status_color(status: OrderStatus, theme: &MarketTheme) -> Color {
    match status {
        OrderStatus::Pending => theme.text_dim,
        OrderStatus::Processing => theme.info,
        OrderStatus::Shipped => theme.secondary,
        OrderStatus::Completed => theme.success,
        OrderStatus::Cancelled => theme.error,
    }
}

pub fn shipment_status_color(status: ShipmentStatus, theme: &MarketTheme) -> Color {
    match status {
        ShipmentStatus::Preparing => theme.text_dim,
        ShipmentStatus::InTransit => theme.info,
        ShipmentStatus::OutForDelivery => theme.secondary,
        ShipmentStatus::Delivered => theme.success,
    }
}

pub fn toast_level_color(level: ToastLevel, theme: &MarketTheme) -> Color {
    match level {
        ToastLevel::Info => theme.info,
        ToastLevel::Warning => theme.warning,
        ToastLevel::Error => theme.error,
        ToastLevel::Success => theme.success,
    }
}

pub fn stock_color(stock: i64, theme: &MarketTheme) -> Color {
    if stock <= 0 {
        theme.error
    } else if stock < 10 {
        theme.warning
    } else {
        theme.success
    }
}
