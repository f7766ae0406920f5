//! Reply text for each dispatch outcome.

use crate::backend::{
    DailyCallReport, MonthlyCallReport, OrderStatus, PhoneConfigResult, PhoneLines, SystemStatus,
    WeeklyCallReport,
};

/// Reply when `phone_config` arrives without a phone number.
pub const PHONE_CONFIG_USAGE: &str =
    "❌ Vui lòng cung cấp số điện thoại cần cấu hình!\nVí dụ: `cấu hình số 0901234567`";

/// Reply when `check_order` arrives without an order id.
pub const ORDER_ID_PROMPT: &str =
    "❓ Vui lòng cung cấp mã đơn hàng cần kiểm tra!\nVí dụ: `kiểm tra đơn hàng DH12345`";

/// Reply when a backend action fails or times out.
pub const APOLOGY: &str =
    "⚠️ Xin lỗi, hệ thống đang gặp sự cố khi xử lý yêu cầu. Vui lòng thử lại sau!";

/// Reply when the backend has no record of the requested item (e.g. an unknown order id).
pub fn format_not_found(what: &str) -> String {
    format!(
        "🔍 Không tìm thấy {}.\nVui lòng kiểm tra lại mã và thử lại!",
        what
    )
}

pub const UNKNOWN_COMMAND: &str = "❓ **LỆNH KHÔNG ĐƯỢC NHẬN DIỆN**

Các lệnh có sẵn:
• `báo cáo cuộc gọi hôm nay`
• `thống kê tuần này`
• `báo cáo tháng`
• `kiểm tra trạng thái hệ thống`
• `danh sách số điện thoại`
• `cấu hình số [số_điện_thoại]`
• `kiểm tra đơn hàng [mã_đơn]`

Ví dụ: `@BotBiva báo cáo cuộc gọi hôm nay` 🤖";

fn now_stamp() -> String {
    chrono::Local::now().format("%H:%M %d/%m/%Y").to_string()
}

pub fn format_daily_report(data: &DailyCallReport) -> String {
    format!(
        "📞 **BÁO CÁO CUỘC GỌI HÔM NAY**\n\n\
         🔢 Tổng cuộc gọi: {}\n\
         ✅ Thành công: {}\n\
         ❌ Thất bại: {}\n\
         ⏱️ Thời lượng TB: {}\n\n\
         _Cập nhật lúc: {}_",
        data.total_calls,
        data.successful_calls,
        data.failed_calls,
        data.avg_duration,
        now_stamp()
    )
}

pub fn format_weekly_report(data: &WeeklyCallReport) -> String {
    let daily = data
        .daily_breakdown
        .iter()
        .map(|d| format!("  • {}: {} cuộc gọi", d.date, d.calls))
        .collect::<Vec<_>>()
        .join("\n");
    format!(
        "📊 **BÁO CÁO TUẦN**\n\n\
         🔢 Tổng cuộc gọi: {}\n\
         ✅ Thành công: {}\n\
         ❌ Thất bại: {}\n\n\
         📈 **Chi tiết theo ngày:**\n{}\n\n\
         _Cập nhật lúc: {}_",
        data.total_calls,
        data.successful_calls,
        data.failed_calls,
        daily,
        now_stamp()
    )
}

pub fn format_monthly_report(data: &MonthlyCallReport) -> String {
    format!(
        "📈 **BÁO CÁO THÁNG**\n\n\
         🔢 Tổng cuộc gọi: {}\n\
         📊 Tăng trưởng: {}\n\
         🕒 Giờ cao điểm: {}\n\n\
         _Cập nhật lúc: {}_",
        data.total_calls,
        data.growth_rate,
        data.busiest_hour,
        now_stamp()
    )
}

fn status_emoji(status: &str) -> &'static str {
    match status {
        "Hoạt động tốt" => "🟢",
        "Cảnh báo" => "🟡",
        "Bảo trì" => "🔴",
        _ => "⚪",
    }
}

pub fn format_system_status(data: &SystemStatus) -> String {
    format!(
        "🖥️ **TRẠNG THÁI HỆ THỐNG**\n\n\
         {} Tình trạng: {}\n\
         ⏳ Uptime: {}\n\
         🔄 Khởi động lần cuối: {}\n\
         📞 Đường dây hoạt động: {}/10\n\
         ⏰ Hàng đợi: {} cuộc gọi\n\n\
         _Kiểm tra lúc: {}_",
        status_emoji(&data.overall_status),
        data.overall_status,
        data.uptime,
        data.last_restart,
        data.active_lines,
        data.queue_length,
        now_stamp()
    )
}

pub fn format_phone_lines(data: &PhoneLines) -> String {
    let numbers = data
        .configured_numbers
        .iter()
        .map(|n| format!("  • {}", n))
        .collect::<Vec<_>>()
        .join("\n");
    format!(
        "📱 **CẤU HÌNH SỐ ĐIỆN THOẠI**\n\n\
         📋 **Số đã cấu hình:**\n{}\n\n\
         📊 Tổng đường dây: {}\n\
         🟢 Đang hoạt động: {}\n\
         🕒 Thay đổi cuối: {}\n\n\
         _Cập nhật lúc: {}_",
        numbers,
        data.total_lines,
        data.active_lines,
        data.last_config_change,
        now_stamp()
    )
}

pub fn format_config_result(result: &PhoneConfigResult) -> String {
    if result.success {
        format!(
            "✅ **CẤU HÌNH THÀNH CÔNG**\n\n\
             📱 Số điện thoại: {}\n\
             🔄 Trạng thái: {}\n\
             🕒 Thời gian: {}\n\n\
             Số điện thoại đã sẵn sàng sử dụng! 🎉",
            result.phone, result.status, result.configured_at
        )
    } else {
        format!(
            "❌ **CẤU HÌNH THẤT BẠI**\n\n\
             📱 Số: {}\n\
             💬 Lỗi: {}\n\
             🔧 Mã lỗi: {}\n\n\
             Vui lòng thử lại sau! 🔄",
            result.phone,
            result.message,
            result.error_code.as_deref().unwrap_or("UNKNOWN")
        )
    }
}

pub fn format_order_status(order: &OrderStatus) -> String {
    format!(
        "📦 **TRẠNG THÁI ĐƠN HÀNG**\n\n\
         🔖 Mã đơn: {}\n\
         🚚 Trạng thái: {}\n\
         👤 Khách hàng: {}\n\
         💰 Tổng tiền: {}\n\n\
         _Cập nhật lúc: {}_",
        order.order_id, order.status, order.customer, order.total, order.updated_at
    )
}
