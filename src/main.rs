//! 程序入口：初始化日志、加载 Slint UI，并绑定双栏对比的 VM 回调

use std::{cell::RefCell, path::PathBuf, rc::Rc};
use std::time::Instant;
use tracing_subscriber::fmt::SubscriberBuilder;
use slint::{ComponentHandle, ModelRc, VecModel};

slint::include_modules!();

use json_duibi::model::comparator::DiffKeying;
use json_duibi::model::data_core::{AppState, Side};
use json_duibi::model::render_tree::{RowClass, TreeRow};
use json_duibi::utils::clipboard::copy_to_clipboard;
use json_duibi::vm::bridge::*;

// TreeRowData转换实现
impl From<&TreeRow> for TreeRowData {
    /// 将Rust TreeRow转换为Slint可用的数据结构
    fn from(row: &TreeRow) -> Self {
        Self {
            path: row.path.clone().into(),
            key: row.key.clone().unwrap_or_default().into(),
            has_key: row.key.is_some(),
            text: row.text.clone().into(),
            depth: row.depth as i32,
            band: row.class.band().map(i32::from).unwrap_or(-1),
            highlighted: row.class == RowClass::Highlighted,
            value_highlighted: row.value_highlighted,
            expandable: row.expandable,
            open: row.open,
            sticky: row.sticky,
        }
    }
}

/// VM桥接器：管理UI与数据层的交互
struct ViewModelBridge {
    app_state: Rc<RefCell<AppState>>,
}

impl ViewModelBridge {
    /// 创建新的VM桥接器并绑定所有回调
    fn new(app_window: &AppWindow, app_state: Rc<RefCell<AppState>>) -> Self {
        let bridge = Self { app_state };
        bridge.setup_callbacks(app_window);
        bridge
    }

    /// 设置所有UI回调函数
    fn setup_callbacks(&self, app_window: &AppWindow) {
        let app_state = self.app_state.clone();

        // === 文本编辑回调 ===
        {
            let app_state = app_state.clone();
            let app_window_weak = app_window.as_weak();
            app_window.on_text_edited(move |side, text| {
                if let (Some(app_window), Some(side)) = (app_window_weak.upgrade(), Side::from_index(side)) {
                    Self::handle_text_edited(&app_window, &app_state, side, text.as_str());
                }
            });
        }

        // === 节点点击（展开/折叠）回调 ===
        {
            let app_state = app_state.clone();
            let app_window_weak = app_window.as_weak();
            app_window.on_node_clicked(move |side, path| {
                if let (Some(app_window), Some(side)) = (app_window_weak.upgrade(), Side::from_index(side)) {
                    Self::handle_node_clicked(&app_window, &app_state, side, path.as_str());
                }
            });
        }

        // === 加载文件回调 ===
        {
            let app_state = app_state.clone();
            let app_window_weak = app_window.as_weak();
            app_window.on_load_file(move |side| {
                if let (Some(app_window), Some(side)) = (app_window_weak.upgrade(), Side::from_index(side)) {
                    Self::handle_load_file(&app_window, &app_state, side);
                }
            });
        }

        // === 复制节点回调 ===
        {
            let app_state = app_state.clone();
            let app_window_weak = app_window.as_weak();
            app_window.on_copy_node(move |side| {
                if let (Some(app_window), Some(side)) = (app_window_weak.upgrade(), Side::from_index(side)) {
                    Self::handle_copy_node(&app_window, &app_state, side);
                }
            });
        }

        // === 对比开关 / 粘滞模式 / 键空间 ===
        {
            let app_state = app_state.clone();
            let app_window_weak = app_window.as_weak();
            app_window.on_compare_toggled(move |enabled| {
                if let Some(app_window) = app_window_weak.upgrade() {
                    app_state.borrow_mut().set_comparison_enabled(enabled);
                    Self::refresh_all(&app_window, &app_state);
                }
            });
        }
        {
            let app_state = app_state.clone();
            let app_window_weak = app_window.as_weak();
            app_window.on_sticky_toggled(move |sticky| {
                if let Some(app_window) = app_window_weak.upgrade() {
                    app_state.borrow_mut().set_sticky(sticky);
                    Self::refresh_rows(&app_window, &app_state);
                }
            });
        }
        {
            let app_state = app_state.clone();
            let app_window_weak = app_window.as_weak();
            app_window.on_keying_toggled(move |path_keyed| {
                if let Some(app_window) = app_window_weak.upgrade() {
                    let keying = if path_keyed { DiffKeying::Path } else { DiffKeying::Flat };
                    app_state.borrow_mut().set_keying(keying);
                    Self::refresh_all(&app_window, &app_state);
                }
            });
        }

        // === 复制差异报告回调 ===
        {
            let app_state = app_state.clone();
            let app_window_weak = app_window.as_weak();
            app_window.on_copy_report(move || {
                if let Some(app_window) = app_window_weak.upgrade() {
                    Self::handle_copy_report(&app_window, &app_state);
                }
            });
        }
    }

    /// 初始化UI状态
    fn initialize_ui(&self, app_window: &AppWindow) {
        app_window.set_status_message(STATUS_READY.into());
        app_window.set_diff_summary("".into());
        app_window.set_subject_text("".into());
        app_window.set_reference_text("".into());

        let state = self.app_state.borrow();
        app_window.set_compare_enabled(state.comparison_enabled);
        app_window.set_sticky_mode(state.sticky);
        app_window.set_path_keyed(state.keying == DiffKeying::Path);
        drop(state);

        Self::refresh_all(app_window, &self.app_state);
    }

    /// 处理一侧文本变化：解析、重算差异、刷新两侧
    fn handle_text_edited(app_window: &AppWindow, app_state: &Rc<RefCell<AppState>>, side: Side, text: &str) {
        let start_time = Instant::now();
        let raw = app_state.borrow_mut().set_text(side, text);

        // 预处理改写了输入时，编辑框回填改写后的文本
        if raw != text {
            Self::set_side_text(app_window, side, &raw);
        }

        Self::refresh_all(app_window, app_state);
        tracing::info!("{} 输入处理完成，耗时: {}ms", side.label(), start_time.elapsed().as_millis());
    }

    /// 处理节点展开/折叠切换
    fn handle_node_clicked(app_window: &AppWindow, app_state: &Rc<RefCell<AppState>>, side: Side, path: &str) {
        let open = app_state.borrow_mut().toggle_node(side, path);
        Self::refresh_rows(app_window, app_state);

        let action = if open { "展开" } else { "折叠" };
        app_window.set_status_message(format!("{}{}: {}", side.label(), action, path).into());
    }

    /// 显示文件选择对话框
    fn show_file_dialog(side: Side) -> Option<PathBuf> {
        use rfd::FileDialog;

        let file_path = FileDialog::new()
            .add_filter("JSON文件", &["json"])
            .add_filter("所有文件", &["*"])
            .set_title(format!("选择{}", side.label()))
            .pick_file();

        match file_path {
            Some(path) => {
                tracing::info!("用户选择了文件: {}", path.display());
                Some(path)
            }
            None => {
                tracing::info!("用户取消了文件选择");
                None
            }
        }
    }

    /// 处理加载文件操作
    fn handle_load_file(app_window: &AppWindow, app_state: &Rc<RefCell<AppState>>, side: Side) {
        let Some(file_path) = Self::show_file_dialog(side) else {
            app_window.set_status_message("未选择文件".into());
            return;
        };

        let load_result = app_state.borrow_mut().load_file(side, &file_path);
        match load_result {
            Ok(()) => {
                let raw = app_state.borrow().panel(side).raw_text.clone();
                Self::set_side_text(app_window, side, &raw);
                Self::refresh_all(app_window, app_state);
                app_window.set_status_message(format!("{}: {}", STATUS_LOADED, file_path.display()).into());
            }
            Err(e) => {
                app_window.set_status_message(format!("{}{}", STATUS_ERROR_PREFIX, e).into());
                tracing::error!("文件加载失败: {}", e);
            }
        }
    }

    /// 复制最近点击节点的 pretty JSON
    fn handle_copy_node(app_window: &AppWindow, app_state: &Rc<RefCell<AppState>>, side: Side) {
        let result = app_state
            .borrow()
            .extract_selected(side)
            .and_then(|text| copy_to_clipboard(&text).map(|_| text.len()));
        match result {
            Ok(len) => {
                app_window.set_status_message(STATUS_COPIED.into());
                tracing::info!("节点内容已复制到剪贴板，长度: {} 字符", len);
            }
            Err(e) => {
                app_window.set_status_message(format!("{}{}", STATUS_ERROR_PREFIX, e).into());
                tracing::error!("复制节点失败: {}", e);
            }
        }
    }

    /// 复制当前差异报告
    fn handle_copy_report(app_window: &AppWindow, app_state: &Rc<RefCell<AppState>>) {
        let result = app_state
            .borrow()
            .diff_report()
            .and_then(|report| copy_to_clipboard(&report));
        match result {
            Ok(()) => app_window.set_status_message(STATUS_COPIED.into()),
            Err(e) => {
                app_window.set_status_message(format!("{}{}", STATUS_ERROR_PREFIX, e).into());
                tracing::error!("复制差异报告失败: {}", e);
            }
        }
    }

    fn set_side_text(app_window: &AppWindow, side: Side, text: &str) {
        match side {
            Side::Subject => app_window.set_subject_text(text.into()),
            Side::Reference => app_window.set_reference_text(text.into()),
        }
    }

    /// 重新构建两侧树模型
    fn refresh_rows(app_window: &AppWindow, app_state: &Rc<RefCell<AppState>>) {
        let state = app_state.borrow();
        for side in [Side::Subject, Side::Reference] {
            let rows: Vec<TreeRowData> = state.rows(side).iter().map(TreeRowData::from).collect();
            let model = ModelRc::new(VecModel::from(rows));
            let error = state.panel(side).error().unwrap_or_default().to_string();
            match side {
                Side::Subject => {
                    app_window.set_subject_rows(model);
                    app_window.set_subject_error(error.into());
                }
                Side::Reference => {
                    app_window.set_reference_rows(model);
                    app_window.set_reference_error(error.into());
                }
            }
        }
    }

    /// 差异重算后刷新树模型与状态栏
    fn refresh_all(app_window: &AppWindow, app_state: &Rc<RefCell<AppState>>) {
        Self::refresh_rows(app_window, app_state);

        let state = app_state.borrow();
        let status = if !state.comparison_enabled {
            STATUS_COMPARE_OFF
        } else if state.reference.raw_text.is_empty() {
            STATUS_WAITING_REFERENCE
        } else {
            STATUS_COMPARED
        };
        app_window.set_status_message(status.into());
        app_window.set_diff_summary(
            format!(
                "主文档独有/不一致: {} | 参照独有: {}",
                state.diffs.side_b.len(),
                state.diffs.side_a.len()
            )
            .into(),
        );
    }
}

fn main() -> anyhow::Result<()> {
    // 初始化日志输出
    let _ = SubscriberBuilder::default()
        .with_max_level(tracing::Level::INFO)
        .try_init();

    let app = AppWindow::new().map_err(|e| anyhow::anyhow!("UI 初始化失败: {}", e))?;
    let state = Rc::new(RefCell::new(AppState::default()));

    // 创建VM桥接器并绑定UI回调
    let bridge = ViewModelBridge::new(&app, state);
    bridge.initialize_ui(&app);

    tracing::info!("{} 启动成功，UI已初始化", WINDOW_TITLE);
    app.run().map_err(|e| anyhow::anyhow!("事件循环异常退出: {}", e))?;
    Ok(())
}
