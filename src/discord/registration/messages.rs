// User-facing texts for registration replies.
//
// Pure formatting over core results, kept apart from the handlers so the
// wording can be tested without a Discord connection.

use crate::core::registration::{
    GuildError, PendingReport, RegistrationError, RegistrationOutcome, SetupReport,
};
use chrono::{DateTime, Duration, Utc};

/// Translate a registration failure into something the member can act on.
pub fn describe_error(err: &RegistrationError) -> String {
    match err {
        RegistrationError::EmptyName => "❌ Informe seu nome no jogo.".to_string(),
        RegistrationError::NicknameTooLong { nickname, max } => format!(
            "❌ O apelido **{}** passa do limite de {} caracteres. Use um nome menor.",
            nickname, max
        ),
        RegistrationError::NotConfigured { .. } => {
            "❌ Os cargos de cadastro ainda não existem. Um administrador precisa rodar `/setup`."
                .to_string()
        }
        RegistrationError::NicknameForbidden(_) => "❌ Não consegui mudar seu apelido. \
             Coloque o bot acima dos cargos e dê permissão de 'Gerenciar Apelidos'."
            .to_string(),
        RegistrationError::NicknameRejected(reason) => {
            format!("❌ O Discord recusou o apelido: {}", reason)
        }
        RegistrationError::RolesForbidden(_) => "❌ Não consegui mexer nos seus cargos. \
             O bot precisa de 'Gerenciar Cargos' e estar acima dos cargos."
            .to_string(),
        RegistrationError::Guild(GuildError::RateLimited) => {
            "⏳ O Discord limitou as requisições. Tente de novo em instantes.".to_string()
        }
        RegistrationError::Guild(GuildError::Forbidden(reason)) => {
            format!("❌ O bot não tem permissão para isso: {}", reason)
        }
        RegistrationError::Guild(other) => format!("❌ Erro no Discord: {}", other),
    }
}

pub fn registration_success(outcome: &RegistrationOutcome) -> String {
    format!(
        "✅ Registrado com sucesso. Seu nick agora é **{}**.",
        outcome.nickname
    )
}

pub fn setup_summary(report: &SetupReport) -> String {
    if report.is_noop() {
        return "✅ Setup concluído. Nada a mudar, o servidor já está configurado.".to_string();
    }

    let mut lines = vec!["✅ Setup concluído.".to_string()];
    let sections = [
        ("Cargos criados", &report.roles_created),
        ("Cargos sincronizados", &report.roles_updated),
        ("Categorias criadas", &report.categories_created),
        ("Canais criados", &report.channels_created),
        ("Canais sincronizados", &report.channels_synced),
    ];
    for (label, names) in sections {
        if !names.is_empty() {
            lines.push(format!("• {}: {}", label, names.join(", ")));
        }
    }
    if report.panel_posted {
        lines.push("• Painel de cadastro publicado".to_string());
    }
    lines.join("\n")
}

/// Compact waiting time, e.g. `3d 4h`, `2h 15min`, `40min`.
pub fn format_waiting(waited: Duration) -> String {
    let minutes = waited.num_minutes().max(0);
    let (days, hours, mins) = (minutes / 1440, (minutes % 1440) / 60, minutes % 60);
    if days > 0 {
        format!("{}d {}h", days, hours)
    } else if hours > 0 {
        format!("{}h {}min", hours, mins)
    } else if mins > 0 {
        format!("{}min", mins)
    } else {
        "menos de 1min".to_string()
    }
}

pub fn pending_summary(report: &PendingReport, now: DateTime<Utc>) -> String {
    let mut out = format!("⛔ Não Registrados: **{}**", report.total);
    if report.oldest.is_empty() {
        return out;
    }

    out.push_str("\nAguardando há mais tempo:");
    for member in &report.oldest {
        let waited = match member.joined_at {
            Some(joined_at) => format!("entrou há {}", format_waiting(now - joined_at)),
            None => "entrada desconhecida".to_string(),
        };
        out.push_str(&format!(
            "\n• <@{}> ({}) {}",
            member.user_id, member.display_name, waited
        ));
    }

    let hidden = report.total.saturating_sub(report.oldest.len());
    if hidden > 0 {
        out.push_str(&format!("\n… e mais {}", hidden));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::registration::PendingMember;

    #[test]
    fn test_format_waiting() {
        assert_eq!(format_waiting(Duration::seconds(20)), "menos de 1min");
        assert_eq!(format_waiting(Duration::minutes(40)), "40min");
        assert_eq!(format_waiting(Duration::minutes(135)), "2h 15min");
        assert_eq!(format_waiting(Duration::hours(76)), "3d 4h");
        assert_eq!(format_waiting(Duration::minutes(-5)), "menos de 1min");
    }

    #[test]
    fn test_registration_success_shows_nickname() {
        let outcome = RegistrationOutcome {
            nickname: "Rec Alice".into(),
            previous_nickname: None,
            removed_unregistered: true,
            added_registered: true,
        };
        assert!(registration_success(&outcome).contains("**Rec Alice**"));
    }

    #[test]
    fn test_setup_summary_noop() {
        let summary = setup_summary(&SetupReport::default());
        assert!(summary.contains("Nada a mudar"));
    }

    #[test]
    fn test_setup_summary_lists_changes() {
        let report = SetupReport {
            roles_created: vec!["Registrado".into(), "Não Registrado".into()],
            channels_synced: vec!["💬-chat-geral".into()],
            panel_posted: true,
            ..Default::default()
        };
        let summary = setup_summary(&report);
        assert!(summary.contains("• Cargos criados: Registrado, Não Registrado"));
        assert!(summary.contains("• Canais sincronizados: 💬-chat-geral"));
        assert!(summary.contains("Painel de cadastro publicado"));
        assert!(!summary.contains("Categorias criadas"));
    }

    #[test]
    fn test_pending_summary() {
        let now = Utc::now();
        let report = PendingReport {
            total: 3,
            oldest: vec![
                PendingMember {
                    user_id: 7,
                    display_name: "novato".into(),
                    joined_at: Some(now - Duration::hours(26)),
                },
                PendingMember {
                    user_id: 8,
                    display_name: "sumido".into(),
                    joined_at: None,
                },
            ],
        };

        let summary = pending_summary(&report, now);

        assert!(summary.starts_with("⛔ Não Registrados: **3**"));
        assert!(summary.contains("<@7> (novato) entrou há 1d 2h"));
        assert!(summary.contains("<@8> (sumido) entrada desconhecida"));
        assert!(summary.ends_with("… e mais 1"));
    }

    #[test]
    fn test_pending_summary_empty() {
        let report = PendingReport {
            total: 0,
            oldest: Vec::new(),
        };
        assert_eq!(
            pending_summary(&report, Utc::now()),
            "⛔ Não Registrados: **0**"
        );
    }

    #[test]
    fn test_describe_error_variants() {
        assert!(describe_error(&RegistrationError::NotConfigured {
            registered: "Registrado".into(),
            unregistered: "Não Registrado".into(),
        })
        .contains("/setup"));
        assert!(
            describe_error(&RegistrationError::NicknameForbidden("x".into()))
                .contains("Gerenciar Apelidos")
        );
        assert!(
            describe_error(&RegistrationError::Guild(GuildError::RateLimited))
                .starts_with("⏳")
        );
        assert!(describe_error(&RegistrationError::NicknameTooLong {
            nickname: "Rec abc".into(),
            max: 32,
        })
        .contains("32 caracteres"));
    }
}
