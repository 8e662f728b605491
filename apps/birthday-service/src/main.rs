//! # Birthday Service サーバー
//!
//! 誕生日記録を管理し、当日の誕生日に通知メールを送る API サーバー。
//!
//! ## 役割
//!
//! - **誕生日記録**: 名前・日付・連絡先の登録と一覧
//! - **日次スキャン**: `GET /scan` で今日が誕生日の未送信記録に通知し、送信済みにする
//! - **単発通知**: `POST /notify` で指定した宛先に 1 通送る
//!
//! スキャンの定期実行は外部スケジューラ（cron など）に委ねる。
//!
//! ## 環境変数
//!
//! | 変数名 | 必須 | 説明 |
//! |--------|------|------|
//! | `HBD_HOST` | No | バインドアドレス（デフォルト: `0.0.0.0`） |
//! | `HBD_PORT` | **Yes** | ポート番号 |
//! | `DATABASE_URL` | **Yes** | PostgreSQL 接続 URL |
//! | `NOTIFICATION_BACKEND` | No | `resend`（デフォルト）/ `smtp` / `noop` |
//! | `RESEND_API_KEY` | resend 時 | 未設定ならメール送信は無効 |
//! | `SCAN_PACING_MS` | No | 送信間隔（デフォルト: 1000） |
//!
//! ## 起動方法
//!
//! ```bash
//! HBD_PORT=3000 DATABASE_URL=postgres://... cargo run -p hbd-service
//! ```

use std::{net::SocketAddr, sync::Arc};

use hbd_domain::clock::{Clock, SystemClock};
use hbd_infra::{
    db,
    repository::{BirthdayRepository, PostgresBirthdayRepository},
};
use hbd_service::{
    config::ServiceConfig,
    handler::{self, BirthdayState, NotificationState, ScanState},
    usecase::{BirthdayUseCaseImpl, NotificationUseCaseImpl, ScanUseCaseImpl, TemplateRenderer},
};
use hbd_shared::observability::{TracingConfig, init_tracing};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

/// Birthday Service サーバーのエントリーポイント
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env ファイルを読み込む（存在する場合）
    dotenvy::dotenv().ok();

    // トレーシング初期化
    init_tracing(&TracingConfig::from_env("birthday-service"));
    let _tracing_guard = tracing::info_span!("app", service = "birthday-service").entered();

    // 設定読み込み
    let config = ServiceConfig::from_env()?;

    tracing::info!(
        "Birthday Service サーバーを起動します: {}:{}",
        config.host,
        config.port
    );

    // データベース接続プールを作成
    let pool = db::create_pool(&config.database_url).await?;
    tracing::info!("データベースに接続しました");

    db::run_migrations(&pool).await?;
    tracing::info!("マイグレーションを適用しました");

    // 依存コンポーネントを初期化
    let repo: Arc<dyn BirthdayRepository> = Arc::new(PostgresBirthdayRepository::new(pool));
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let renderer = Arc::new(TemplateRenderer::new()?);
    let sender = config.notification.build_sender();
    match &sender {
        Some(_) => tracing::info!(
            backend = %config.notification.backend,
            "メール送信基盤を初期化しました"
        ),
        None => tracing::warn!(
            backend = %config.notification.backend,
            "メール送信基盤が未構成のため /notify と /scan は失敗します"
        ),
    }

    let birthday_state = Arc::new(BirthdayState {
        usecase: BirthdayUseCaseImpl::new(repo.clone(), clock.clone()),
    });
    let notification_state = Arc::new(NotificationState {
        usecase: NotificationUseCaseImpl::new(sender.clone(), renderer.clone()),
    });
    let scan_state = Arc::new(ScanState {
        usecase: ScanUseCaseImpl::new(repo, sender, renderer, clock, config.scan_pacing),
    });

    // ルーター構築
    let app = handler::router(birthday_state, notification_state, scan_state)
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;

    let listener = TcpListener::bind(addr).await?;
    tracing::info!("Birthday Service サーバーが起動しました: {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
