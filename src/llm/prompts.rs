use crate::models::Language;

/// Preamble for story restructuring; the story is embedded after it
///
/// All prompts are Brazilian Portuguese, the language of the stories and the generated Gherkin.
const NORMALIZE_PREAMBLE: &str = "\
Você é um analista de requisitos especializado. Sua tarefa é reformular a história de usuário \
fornecida de forma clara e estruturada, SEM INVENTAR nenhuma informação nova.

REGRAS IMPORTANTES:
- Use APENAS as informações fornecidas
- NÃO adicione funcionalidades não mencionadas
- NÃO invente detalhes técnicos
- Organize melhor o texto existente
- Deixe mais claro e estruturado
- Mantenha a essência e objetivo original";

const NORMALIZE_INSTRUCTIONS: &str = "\
INSTRUÇÕES:
- Se for uma história mal formatada, organize melhor
- Se for muito técnica, mantenha os detalhes técnicos
- Se for muito simples, mantenha simples
- Se tiver múltiplas funcionalidades, liste cada uma claramente
- Use linguagem clara e objetiva

Reformule a história mantendo todas as informações originais, apenas organizando melhor:";

const PYTHON_GUIDELINES: &str = "\
DIRETRIZES PARA CÓDIGO PYTHON:
- Seguir rigorosamente a PEP 8
- Usar type hints em funções e variáveis quando apropriado
- Incluir docstrings no formato Google style
- Implementar tratamento de exceções adequado
- Preferir a biblioteca padrão do Python
- Aplicar princípios SOLID e Clean Code
- Usar nomes descritivos e validar as entradas

ESTRUTURA ESPERADA:
- Imports organizados (padrão, terceiros, locais)
- Constantes no topo, se necessário
- Classes e funções bem definidas
- Função main() se for script executável

QUALIDADE DO CÓDIGO:
- Código executável e sem erros
- Implementar a funcionalidade completa descrita
- Código self-contained, sem dependências externas complexas";

const JAVA_GUIDELINES: &str = "\
DIRETRIZES PARA CÓDIGO JAVA:
- Seguir as convenções Java (camelCase, PascalCase para classes)
- Usar recursos do Java 11+ quando apropriado
- Incluir JavaDoc para classes e métodos públicos
- Implementar tratamento de exceções robusto
- Aplicar design patterns e princípios SOLID quando fizer sentido
- Usar generics e Optional para segurança de tipos
- Implementar validações de entrada

ESTRUTURA ESPERADA:
- Declaração de package no topo
- Imports organizados (java.*, javax.*, terceiros, locais)
- Uma classe pública principal bem definida
- Constantes como static final
- Métodos organizados (construtor, públicos, privados)
- Método main() se for aplicação executável

QUALIDADE DO CÓDIGO:
- Código deve compilar sem erros
- Implementar a funcionalidade completa descrita
- Código self-contained, sem dependências externas complexas
- Implementar equals() e hashCode() quando apropriado";

const BDD_GUIDELINES: &str = "\
DIRETRIZES PARA TESTES BDD:
- Use o formato Gherkin padrão (Feature, Scenario, Given, When, Then)
- Escreva em português brasileiro
- Cubra o caminho feliz, erros, validações de entrada e casos extremos
- Cada cenário deve ser independente e testar uma única funcionalidade
- Use exemplos concretos e realistas e linguagem de negócio

ESTRUTURA ESPERADA:
Feature: [Nome da funcionalidade]
  Como [tipo de usuário]
  Eu quero [objetivo]
  Para que [benefício]

  Background: (se necessário)
    Given [pré-condições comuns]

  Scenario: [Cenário de sucesso]
    Given [contexto inicial]
    When [ação executada]
    Then [resultado esperado]

  Scenario: [Cenário de erro]
    Given [contexto inicial]
    When [ação que causa erro]
    Then [erro esperado]";

const BDD_OUTPUT_FORMAT: &str = "\
FORMATO DE SAÍDA:
- APENAS código Gherkin (.feature)
- Não inclua explicações fora do formato Gherkin
- Não inclua markdown ou formatação especial
- Use comentários Gherkin (#) apenas se necessário

Agora gere os testes BDD no formato Gherkin baseados no código fornecido:";

/// Prompt asking the lightweight model to restructure a cleaned story
pub fn build_normalize_prompt(story: &str) -> String {
    format!(
        "{}\n\nHISTÓRIA ORIGINAL:\n{}\n\n{}\n",
        NORMALIZE_PREAMBLE, story, NORMALIZE_INSTRUCTIONS
    )
}

/// Prompt asking for complete source code in `language` from a generation context
pub fn build_code_prompt(context_for_generation: &str, language: Language) -> String {
    let (persona, guidelines) = match language {
        Language::Python => (
            "Você é um desenvolvedor Python sênior especializado em criar código limpo, \
             funcional e bem estruturado.",
            PYTHON_GUIDELINES,
        ),
        Language::Java => (
            "Você é um desenvolvedor Java sênior especializado em criar código \
             enterprise-ready, limpo e bem estruturado.",
            JAVA_GUIDELINES,
        ),
    };
    let name = language_display_name(language);

    let mut prompt = String::new();
    prompt.push_str(persona);
    prompt.push_str("\n\n");
    prompt.push_str(&format!(
        "Baseado na história de usuário fornecida, gere código {} completo e funcional.\n\n",
        name
    ));
    prompt.push_str(context_for_generation);
    prompt.push_str("\n\n");
    prompt.push_str(guidelines);
    prompt.push_str("\n\n");
    prompt.push_str("IMPORTANTE:\n");
    prompt.push_str(&format!("- Gere APENAS código {}\n", name));
    prompt.push_str("- Não inclua explicações longas fora do código\n");
    prompt.push_str("- Não inclua markdown ou formatação especial\n");
    prompt.push_str("- O código deve ser direto, limpo e funcional\n\n");
    prompt.push_str(&format!(
        "Agora gere o código {} baseado na história de usuário:\n",
        name
    ));
    prompt
}

/// Prompt asking for a Gherkin suite covering `code`
pub fn build_bdd_prompt(code: &str, language: Language) -> String {
    let mut prompt = String::new();
    prompt.push_str(
        "Você é um especialista em testes BDD (Behavior Driven Development) e Quality Assurance.\n\n",
    );
    prompt.push_str(&format!(
        "Analise o código {} fornecido e gere testes BDD completos no formato Gherkin.\n\n",
        language.upper()
    ));
    prompt.push_str("CÓDIGO A SER TESTADO:\n");
    prompt.push_str(&format!("```{}\n{}\n```\n\n", language.as_str(), code));
    prompt.push_str(BDD_GUIDELINES);
    prompt.push_str("\n\n");
    prompt.push_str(BDD_OUTPUT_FORMAT);
    prompt.push('\n');
    prompt
}

fn language_display_name(language: Language) -> &'static str {
    match language {
        Language::Python => "Python",
        Language::Java => "Java",
    }
}
