use crate::domain::dimension::Dimension;
use serde::Serialize;

const DEMANDAS: [&str; 8] = [
    "No trabalho, diferentes grupos exigem de mim, coisas difíceis de conciliar.",
    "Tenho prazos impossíveis de serem cumpridos.",
    "Tenho que trabalhar muito intensamente.",
    "Preciso deixar de lado algumas tarefas porque tenho coisas demais para fazer.",
    "Não consigo fazer pausas suficientes.",
    "Sou pressionado para trabalhar por longos períodos.",
    "Tenho que trabalhar muito rápido.",
    "Sofro pressões de tempo absurdas.",
];

const CONTROLE: [&str; 7] = [
    "Não posso decidir quando posso fazer uma pausa.",
    "Não sei como fazer para executar meu trabalho.",
    "Não posso decidir sobre meu ritmo de trabalho.",
    "Não posso escolher como devo fazer meu trabalho.",
    "Meu horário de trabalho não pode ser flexível.",
    "Não tenho algum poder de decisão sobre a minha maneira de trabalhar.",
    "Não posso escolher o que fazer no trabalho.",
];

const RELACIONAMENTO: [&str; 4] = [
    "Estou sujeito a assédio pessoal na forma de palavras ou comportamentos rudes.",
    "Existe atrito ou animosidade entre os colegas de trabalho.",
    "Estou sujeito a constrangimentos no trabalho.",
    "Os relacionamentos no trabalho são tensos.",
];

const CARGO: [&str; 4] = [
    "Não sei claramente o que é esperado de mim no trabalho.",
    "Não estou ciente quais são meus deveres e responsabilidades.",
    "Eu não conheço as metas e objetivos do meu departamento.",
    "Não compreendo como meu trabalho se integra com os objetivos da organização.",
];

const MUDANCA: [&str; 3] = [
    "Não tenho oportunidades suficientes para questionar as chefias sobre mudanças no trabalho.",
    "A equipe não é sempre consultada sobre mudança no trabalho.",
    "Quando ocorrem mudanças no trabalho, não sou esclarecido de como elas funcionam na prática.",
];

const APOIO_CHEFIA: [&str; 5] = [
    "Não posso contar com a ajuda do meu chefe imediato para resolver problemas de trabalho.",
    "Não recebo retorno sobre os trabalhos que realizo.",
    "Não posso falar com meu chefe algo que me incomodou no trabalho.",
    "Não recebo apoio quando realizo trabalho que pode ser emocionalmente desgastante.",
    "Meu chefe imediato me desmotiva no trabalho.",
];

const APOIO_COLEGAS: [&str; 4] = [
    "Não recebo ajuda e o apoio necessário dos meus colegas.",
    "Não sou respeitado como eu mereço pelos meus colegas.",
    "Se o trabalho fica difícil, meus colegas não me ajudam.",
    "Meus colegas não estão dispostos a ouvir meus problemas relacionados ao trabalho.",
];

pub fn questions(dimension: Dimension) -> &'static [&'static str] {
    match dimension {
        Dimension::Demandas => &DEMANDAS,
        Dimension::Controle => &CONTROLE,
        Dimension::Relacionamento => &RELACIONAMENTO,
        Dimension::Cargo => &CARGO,
        Dimension::Mudanca => &MUDANCA,
        Dimension::ApoioChefia => &APOIO_CHEFIA,
        Dimension::ApoioColegas => &APOIO_COLEGAS,
    }
}

pub fn description(dimension: Dimension) -> &'static str {
    match dimension {
        Dimension::Demandas => {
            "Avalia a carga de trabalho, pressões de tempo e intensidade das atividades."
        }
        Dimension::Controle => {
            "Mede o nível de autonomia e poder de decisão sobre o próprio trabalho."
        }
        Dimension::Relacionamento => {
            "Analisa a qualidade das relações interpessoais no ambiente de trabalho."
        }
        Dimension::Cargo => "Verifica a clareza sobre papéis, responsabilidades e objetivos.",
        Dimension::Mudanca => {
            "Avalia como as mudanças organizacionais são comunicadas e gerenciadas."
        }
        Dimension::ApoioChefia => "Mede o suporte recebido da liderança imediata.",
        Dimension::ApoioColegas => "Avalia o apoio e colaboração entre os membros da equipe.",
    }
}

#[derive(Debug, Serialize)]
pub struct CatalogQuestion {
    /// 1-based position across the whole questionnaire.
    pub id: usize,
    pub index: usize,
    pub text: &'static str,
}

#[derive(Debug, Serialize)]
pub struct CatalogDimension {
    pub name: Dimension,
    pub label: &'static str,
    pub description: &'static str,
    pub question_count: usize,
    pub questions: Vec<CatalogQuestion>,
}

#[derive(Debug, Serialize)]
pub struct Catalog {
    pub total_questions: usize,
    pub scale_min: i32,
    pub scale_max: i32,
    pub dimensions: Vec<CatalogDimension>,
}

pub fn catalog(scale_min: i32, scale_max: i32) -> Catalog {
    let mut next_id = 1;
    let dimensions: Vec<CatalogDimension> = Dimension::ALL
        .into_iter()
        .map(|dimension| {
            let questions = questions(dimension)
                .iter()
                .enumerate()
                .map(|(index, text)| {
                    let q = CatalogQuestion {
                        id: next_id,
                        index,
                        text,
                    };
                    next_id += 1;
                    q
                })
                .collect();
            CatalogDimension {
                name: dimension,
                label: dimension.label(),
                description: description(dimension),
                question_count: dimension.item_count(),
                questions,
            }
        })
        .collect();

    Catalog {
        total_questions: next_id - 1,
        scale_min,
        scale_max,
        dimensions,
    }
}
