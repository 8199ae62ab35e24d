use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, Paragraph, Wrap};
use ratatui::Frame;

pub mod layout;

use crate::app::{short_address, App, InputMode, StatusLevel};
use crate::config;
use crate::core::{command_hint, InvocationKind, Phase, ProviderStatus};

pub fn draw(f: &mut Frame, app: &App) {
    let areas = layout::areas(f.size());

    draw_header(f, areas.header, app);
    draw_card(f, areas.card, app);
    draw_buttons(f, &areas, app);
    draw_activity(f, areas.activity, app);
    draw_status_line(f, areas.status_line, app);
    draw_command_line(f, areas.command_line, app);

    if app.help_open {
        draw_help_popup(f, areas.size, app);
    }
}

fn draw_header(f: &mut Frame, area: Rect, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(70), Constraint::Percentage(30)])
        .split(area);

    let (endpoint, chain) = match &app.view.provider {
        ProviderStatus::Present { endpoint, chain_id } => {
            (endpoint.clone(), chain_id.to_string())
        }
        _ => (app.endpoints_label.clone(), "--".to_string()),
    };

    let title = Line::from(vec![
        Span::styled(
            "Faucet",
            Style::default()
                .fg(Color::LightCyan)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw("  "),
        Span::styled("RPC", Style::default().fg(Color::DarkGray)),
        Span::raw(format!(" {} ", endpoint)),
        Span::styled("Chain", Style::default().fg(Color::DarkGray)),
        Span::raw(format!(" {}", chain)),
    ]);

    let left = Paragraph::new(title)
        .block(Block::default().borders(Borders::ALL))
        .alignment(Alignment::Left);

    let network = app
        .view
        .contract
        .as_ref()
        .map(|contract| contract.network_id.to_string())
        .unwrap_or_else(|| "--".to_string());
    let right_line = Line::from(vec![
        Span::styled("Network ", Style::default().fg(Color::DarkGray)),
        Span::raw(format!("{}  ", network)),
        Span::styled("Pending ", Style::default().fg(Color::DarkGray)),
        Span::raw(app.view.in_flight.to_string()),
    ]);
    let right = Paragraph::new(right_line)
        .block(Block::default().borders(Borders::ALL))
        .alignment(Alignment::Left);

    f.render_widget(left, chunks[0]);
    f.render_widget(right, chunks[1]);
}

fn draw_card(f: &mut Frame, area: Rect, app: &App) {
    let lines = card_lines(app);
    let paragraph = Paragraph::new(Text::from(lines))
        .block(
            Block::default()
                .title(format!(" {} ", app.contract_name))
                .borders(Borders::ALL),
        )
        .wrap(Wrap { trim: true });
    f.render_widget(paragraph, area);
}

fn card_lines(app: &App) -> Vec<Line<'static>> {
    let label = Style::default().fg(Color::DarkGray);
    let view = &app.view;

    if !view.is_provider_loaded() {
        return vec![Line::from(Span::styled(
            "Looking for a wallet provider...",
            Style::default().fg(Color::LightYellow),
        ))];
    }
    if !view.has_provider() {
        return vec![
            Line::from(Span::styled(
                "Wallet is not detected!",
                Style::default()
                    .fg(Color::LightRed)
                    .add_modifier(Modifier::BOLD),
            )),
            Line::from(Span::styled(
                format!(
                    "Start a node with unlocked accounts at {} or pass --rpc/--ws/--ipc.",
                    app.endpoints_label
                ),
                label,
            )),
        ];
    }

    let mut lines = Vec::new();
    match view.account {
        Some(account) => lines.push(Line::from(vec![
            Span::styled("Account  ", label),
            Span::styled(account.to_string(), Style::default().fg(Color::White)),
        ])),
        None => lines.push(Line::from(vec![
            Span::styled("Account  ", label),
            Span::styled(
                "[c] Connect Wallet",
                Style::default()
                    .fg(Color::LightCyan)
                    .add_modifier(Modifier::BOLD),
            ),
        ])),
    }

    match view.contract.as_ref() {
        Some(contract) => lines.push(Line::from(vec![
            Span::styled("Contract ", label),
            Span::raw(format!("{} ({})", contract.address, contract.name)),
        ])),
        None => lines.push(Line::from(vec![
            Span::styled("Contract ", label),
            Span::styled(
                "not available on this network",
                Style::default().fg(Color::LightYellow),
            ),
        ])),
    }

    lines.push(Line::from(""));
    let balance = view.balance_display().unwrap_or_else(|| "--".to_string());
    let mut balance_line = vec![
        Span::raw("Current Balance: "),
        Span::styled(
            balance,
            Style::default()
                .fg(Color::LightGreen)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(" ETH"),
    ];
    if let Some(at) = app.balance_updated_at {
        balance_line.push(Span::styled(
            format!("  (updated {})", at.format("%H:%M:%S")),
            label,
        ));
    }
    lines.push(Line::from(balance_line));
    lines
}

fn draw_buttons(f: &mut Frame, areas: &layout::UiAreas, app: &App) {
    let enabled = app.view.can_transact();
    draw_button(f, areas.deposit_button, InvocationKind::Deposit, enabled);
    draw_button(f, areas.withdraw_button, InvocationKind::Withdraw, enabled);

    if !enabled {
        let hint = Paragraph::new(Line::from(Span::styled(
            "Connect to a local chain",
            Style::default().fg(Color::DarkGray),
        )));
        // Vertically centre against the bordered buttons
        let row = Rect {
            y: areas.button_hint.y + areas.button_hint.height / 2,
            height: areas.button_hint.height.min(1),
            ..areas.button_hint
        };
        f.render_widget(hint, row);
    }
}

fn draw_button(f: &mut Frame, area: Rect, kind: InvocationKind, enabled: bool) {
    let (key, verb) = match kind {
        InvocationKind::Deposit => ('d', "Donate"),
        InvocationKind::Withdraw => ('w', "Withdraw"),
    };
    let style = if enabled {
        Style::default()
            .fg(Color::LightGreen)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    let button = Paragraph::new(format!("[{key}] {verb} {} ETH", kind.ether()))
        .style(style)
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL).border_style(style));
    f.render_widget(button, area);
}

fn draw_activity(f: &mut Frame, area: Rect, app: &App) {
    let items: Vec<ListItem> = if app.activity.is_empty() {
        vec![ListItem::new(Line::from(Span::styled(
            "No activity yet",
            Style::default().fg(Color::DarkGray),
        )))]
    } else {
        app.activity
            .iter()
            .map(|entry| {
                let color = match entry.level {
                    StatusLevel::Info => Color::White,
                    StatusLevel::Warn => Color::LightYellow,
                    StatusLevel::Error => Color::LightRed,
                };
                ListItem::new(Line::from(vec![
                    Span::styled(
                        format!("{} ", entry.at.format("%H:%M:%S")),
                        Style::default().fg(Color::DarkGray),
                    ),
                    Span::styled(entry.text.clone(), Style::default().fg(color)),
                ]))
            })
            .collect()
    };

    let list = List::new(items).block(Block::default().title(" Activity ").borders(Borders::ALL));
    f.render_widget(list, area);
}

fn phase_label(phase: Phase) -> &'static str {
    match phase {
        Phase::Uninitialized => "detecting",
        Phase::ProviderResolved => "provider",
        Phase::AccountResolved => "account",
        Phase::BalanceLoaded => "ready",
    }
}

fn draw_status_line(f: &mut Frame, area: Rect, app: &App) {
    let account = app
        .view
        .account
        .map(|account| short_address(&account.to_string()))
        .unwrap_or_else(|| "--".to_string());
    let spans = vec![
        Span::styled("State ", Style::default().fg(Color::DarkGray)),
        Span::raw(format!("{}  ", phase_label(app.view.phase()))),
        Span::styled("Account ", Style::default().fg(Color::DarkGray)),
        Span::raw(format!("{}  ", account)),
        Span::styled("Reads ", Style::default().fg(Color::DarkGray)),
        Span::raw(format!("{}  ", app.view.balance_requests)),
        Span::styled("Epoch ", Style::default().fg(Color::DarkGray)),
        Span::raw(app.view.epoch.to_string()),
    ];

    let paragraph = Paragraph::new(Line::from(spans))
        .style(Style::default().fg(Color::White))
        .alignment(Alignment::Left);

    f.render_widget(paragraph, area);
}

fn draw_command_line(f: &mut Frame, area: Rect, app: &App) {
    let content = match app.input_mode {
        InputMode::Command => {
            let hint_text = command_hint(&app.command.input)
                .unwrap_or("connect | deposit | withdraw | reload | copy | help | quit");
            Line::from(vec![
                Span::styled(": ", Style::default().fg(Color::Yellow)),
                Span::raw(app.command.input.clone()),
                Span::styled(
                    format!("  {}", hint_text),
                    Style::default().fg(Color::DarkGray),
                ),
            ])
        }
        InputMode::Normal => {
            if let Some((text, level)) = app.status_text() {
                let color = match level {
                    StatusLevel::Info => Color::LightGreen,
                    StatusLevel::Warn => Color::LightYellow,
                    StatusLevel::Error => Color::LightRed,
                };
                Line::from(vec![
                    Span::styled("msg: ", Style::default().fg(Color::DarkGray)),
                    Span::styled(text.to_string(), Style::default().fg(color)),
                ])
            } else {
                action_hints(app)
            }
        }
    };

    let paragraph = Paragraph::new(content).style(Style::default().fg(Color::White));
    f.render_widget(paragraph, area);
}

fn action_hints(app: &App) -> Line<'static> {
    let key = Style::default().fg(Color::LightCyan);
    let text = Style::default().fg(Color::DarkGray);
    let mut spans = Vec::new();
    if app.view.has_provider() && app.view.account.is_none() {
        spans.push(Span::styled("c", key));
        spans.push(Span::styled(" connect  ", text));
    }
    if app.view.can_transact() {
        spans.push(Span::styled("d", key));
        spans.push(Span::styled(" donate  ", text));
        spans.push(Span::styled("w", key));
        spans.push(Span::styled(" withdraw  ", text));
    }
    for (k, label) in [("r", " reload  "), (":", " command  "), ("?", " help  "), ("q", " quit")] {
        spans.push(Span::styled(k, key));
        spans.push(Span::styled(label, text));
    }
    Line::from(spans)
}

fn draw_help_popup(f: &mut Frame, area: Rect, app: &App) {
    let popup_area = centered_rect(64, 60, area);
    f.render_widget(Clear, popup_area);

    let config_path = config::config_path()
        .map(|path| path.display().to_string())
        .unwrap_or_else(|| "(unknown)".to_string());

    let lines = vec![
        Line::from("Actions"),
        Line::from("  c          Connect wallet (eth_requestAccounts)"),
        Line::from("  d          Donate 1 ETH (addFunds)"),
        Line::from("  w          Withdraw 0.1 ETH (withdraw)"),
        Line::from("  r          Reload balance"),
        Line::from("  y          Copy account address"),
        Line::from("  :          Command line"),
        Line::from("  ?          Toggle help"),
        Line::from("  q          Quit"),
        Line::from("  Mouse      Click a button"),
        Line::from(""),
        Line::from("Commands"),
        Line::from("  :connect :deposit :withdraw :reload :copy :quit"),
        Line::from(""),
        Line::from(format!("Contract: {}", app.contract_name)),
        Line::from(format!("Config:   {}", config_path)),
    ];

    let paragraph = Paragraph::new(Text::from(lines))
        .block(Block::default().title("Help").borders(Borders::ALL))
        .alignment(Alignment::Left)
        .wrap(Wrap { trim: true });

    f.render_widget(paragraph, popup_area);
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
