//! Dispatch: run the backend action bound to an intent and format its reply.
//!
//! Every outcome is a reply string. Backend failures and timeouts become the fixed apology;
//! missing required parameters short-circuit before the backend is called.

use crate::backend::{DataProvider, ProviderError};
use crate::format;
use crate::intent::{Intent, IntentResult, PARAM_ORDER_ID, PARAM_PHONE_NUMBER};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// Intent → action/formatter table over a shared `DataProvider`.
#[derive(Clone)]
pub struct Dispatcher {
    provider: Arc<dyn DataProvider>,
    timeout: Duration,
}

impl Dispatcher {
    pub fn new(provider: Arc<dyn DataProvider>, timeout: Duration) -> Self {
        Self { provider, timeout }
    }

    /// Produce the reply text for a classified command. Never fails.
    pub async fn dispatch(&self, result: &IntentResult) -> String {
        let p = self.provider.as_ref();
        let params = &result.parameters;
        match result.intent {
            Intent::CallReportToday => {
                self.run(result.intent, p.daily_call_report(), |d| {
                    format::format_daily_report(&d)
                })
                .await
            }
            Intent::CallReportWeek => {
                self.run(result.intent, p.weekly_call_report(), |d| {
                    format::format_weekly_report(&d)
                })
                .await
            }
            Intent::CallReportMonth => {
                self.run(result.intent, p.monthly_call_report(), |d| {
                    format::format_monthly_report(&d)
                })
                .await
            }
            Intent::SystemStatus => {
                self.run(result.intent, p.system_status(), |d| {
                    format::format_system_status(&d)
                })
                .await
            }
            Intent::PhoneList => {
                self.run(result.intent, p.phone_lines(), |d| {
                    format::format_phone_lines(&d)
                })
                .await
            }
            Intent::PhoneConfig => {
                let Some(phone) = params.get(PARAM_PHONE_NUMBER) else {
                    return format::PHONE_CONFIG_USAGE.to_string();
                };
                self.run(result.intent, p.configure_phone(phone), |d| {
                    format::format_config_result(&d)
                })
                .await
            }
            Intent::CheckOrder => {
                let Some(order_id) = params.get(PARAM_ORDER_ID) else {
                    return format::ORDER_ID_PROMPT.to_string();
                };
                self.run(result.intent, p.order_status(order_id), |d| {
                    format::format_order_status(&d)
                })
                .await
            }
            Intent::Unknown => format::UNKNOWN_COMMAND.to_string(),
        }
    }

    /// Await one backend action under the timeout and format it, or log and apologize.
    async fn run<T, F, Fmt>(&self, intent: Intent, action: F, formatter: Fmt) -> String
    where
        F: Future<Output = Result<T, ProviderError>>,
        Fmt: FnOnce(T) -> String,
    {
        let outcome = match tokio::time::timeout(self.timeout, action).await {
            Ok(r) => r,
            Err(_) => Err(ProviderError::Timeout(self.timeout.as_secs())),
        };
        match outcome {
            Ok(data) => formatter(data),
            Err(ProviderError::NotFound(what)) => {
                log::info!("dispatch {}: {} not found", intent, what);
                format::format_not_found(&what)
            }
            Err(e) => {
                log::error!("dispatch {}: backend action failed: {}", intent, e);
                format::APOLOGY.to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{
        DailyCallReport, DemoDataProvider, MonthlyCallReport, OrderStatus, PhoneConfigResult,
        PhoneLines, SystemStatus, WeeklyCallReport,
    };
    use crate::intent::{IntentClassifier, IntentParameters};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Counts calls and fails (or hangs) every action.
    #[derive(Default)]
    struct BrokenProvider {
        calls: AtomicUsize,
        hang: bool,
    }

    impl BrokenProvider {
        async fn fail<T>(&self) -> Result<T, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.hang {
                tokio::time::sleep(Duration::from_secs(60)).await;
            }
            Err(ProviderError::Request("connection refused".to_string()))
        }
    }

    #[async_trait]
    impl DataProvider for BrokenProvider {
        async fn daily_call_report(&self) -> Result<DailyCallReport, ProviderError> {
            self.fail().await
        }
        async fn weekly_call_report(&self) -> Result<WeeklyCallReport, ProviderError> {
            self.fail().await
        }
        async fn monthly_call_report(&self) -> Result<MonthlyCallReport, ProviderError> {
            self.fail().await
        }
        async fn system_status(&self) -> Result<SystemStatus, ProviderError> {
            self.fail().await
        }
        async fn phone_lines(&self) -> Result<PhoneLines, ProviderError> {
            self.fail().await
        }
        async fn configure_phone(&self, _phone: &str) -> Result<PhoneConfigResult, ProviderError> {
            self.fail().await
        }
        async fn order_status(&self, _order_id: &str) -> Result<OrderStatus, ProviderError> {
            self.fail().await
        }
    }

    fn demo_dispatcher() -> Dispatcher {
        Dispatcher::new(Arc::new(DemoDataProvider::new()), Duration::from_secs(5))
    }

    fn result(intent: Intent, parameters: IntentParameters) -> IntentResult {
        IntentResult {
            intent,
            parameters,
            confidence: 0.95,
            original_text: String::new(),
        }
    }

    #[tokio::test]
    async fn daily_report_reply_has_header() {
        let classified = IntentClassifier::new()
            .unwrap()
            .classify("báo cáo cuộc gọi hôm nay");
        let reply = demo_dispatcher().dispatch(&classified).await;
        assert!(reply.contains("BÁO CÁO CUỘC GỌI HÔM NAY"));
        assert!(reply.contains("Tổng cuộc gọi: 42"));
    }

    #[tokio::test]
    async fn phone_config_without_number_skips_backend() {
        let provider = Arc::new(BrokenProvider::default());
        let dispatcher = Dispatcher::new(provider.clone(), Duration::from_secs(5));
        let reply = dispatcher
            .dispatch(&result(Intent::PhoneConfig, IntentParameters::new()))
            .await;
        assert_eq!(reply, format::PHONE_CONFIG_USAGE);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn phone_config_with_number_configures() {
        let params: IntentParameters =
            [(PARAM_PHONE_NUMBER.to_string(), "0901234567".to_string())].into();
        let reply = demo_dispatcher()
            .dispatch(&result(Intent::PhoneConfig, params))
            .await;
        assert!(reply.contains("CẤU HÌNH THÀNH CÔNG"));
        assert!(reply.contains("0901234567"));
    }

    #[tokio::test]
    async fn check_order_without_id_prompts() {
        let reply = demo_dispatcher()
            .dispatch(&result(Intent::CheckOrder, IntentParameters::new()))
            .await;
        assert_eq!(reply, format::ORDER_ID_PROMPT);
    }

    #[tokio::test]
    async fn unknown_order_says_not_found() {
        let params: IntentParameters =
            [(PARAM_ORDER_ID.to_string(), "dh00001".to_string())].into();
        let reply = demo_dispatcher()
            .dispatch(&result(Intent::CheckOrder, params))
            .await;
        assert_ne!(reply, format::APOLOGY);
        assert_eq!(reply, format::format_not_found("đơn hàng DH00001"));
    }

    #[tokio::test]
    async fn unknown_intent_gets_help_text() {
        let reply = demo_dispatcher()
            .dispatch(&result(Intent::Unknown, IntentParameters::new()))
            .await;
        assert_eq!(reply, format::UNKNOWN_COMMAND);
    }

    #[tokio::test]
    async fn backend_failure_becomes_apology() {
        let provider = Arc::new(BrokenProvider::default());
        let dispatcher = Dispatcher::new(provider.clone(), Duration::from_secs(5));
        for intent in [
            Intent::CallReportToday,
            Intent::CallReportWeek,
            Intent::CallReportMonth,
            Intent::SystemStatus,
            Intent::PhoneList,
        ] {
            let reply = dispatcher
                .dispatch(&result(intent, IntentParameters::new()))
                .await;
            assert_eq!(reply, format::APOLOGY, "{intent}");
        }
        assert_eq!(provider.calls.load(Ordering::SeqCst), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn slow_backend_times_out_to_apology() {
        let provider = Arc::new(BrokenProvider {
            hang: true,
            ..Default::default()
        });
        let dispatcher = Dispatcher::new(provider, Duration::from_secs(2));
        let reply = dispatcher
            .dispatch(&result(Intent::SystemStatus, IntentParameters::new()))
            .await;
        assert_eq!(reply, format::APOLOGY);
    }
}
